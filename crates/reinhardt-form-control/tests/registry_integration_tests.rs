//! Field Registry Integration Tests
//!
//! Tests for registration, option grouping, removal and the shadow store.
//!
//! Success Criteria:
//! 1. A name never maps to more than one entry
//! 2. Re-registering a bound handle changes nothing observable
//! 3. Removal drops dirty, touched and error bookkeeping
//! 4. Field-array members survive automatic removal
//! 5. A validation result for a removed field is discarded
//! 6. A validation result for an outdated value is discarded
//!
//! Test Categories:
//! - Category 1: Registration
//! - Category 2: Removal
//! - Category 3: Shadow Store
//! - Category 4: Concurrency and Disposal

use futures::channel::oneshot;
use reinhardt_form_control::memory::{ManualRemovalObserver, MemoryInput};
use reinhardt_form_control::{
	FieldTarget, FormBuilder, FormController, FormError, InputHandle, SetValueOptions,
	ValidateResult, ValidationMode, ValidationRules,
};
use rstest::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[fixture]
fn on_change_form() -> FormController {
	FormBuilder::new().mode(ValidationMode::OnChange).build()
}

fn dirty() -> SetValueOptions {
	SetValueOptions::default().should_dirty(true)
}

// ============================================================================
// Category 1: Registration
// ============================================================================

/// Tests that registering the same handle twice keeps one entry and one state
#[rstest]
#[tokio::test]
async fn test_register_is_idempotent(on_change_form: FormController) {
	let form = on_change_form;
	let name = MemoryInput::text("name");
	let rules = || ValidationRules::new().required("Required");

	form.register(name.handle(), rules()).await.unwrap();
	let before = form.form_state();
	form.register(name.handle(), rules()).await.unwrap();

	assert_eq!(form.field_names(), vec!["name".to_string()]);
	assert_eq!(form.form_state(), before);
	assert!(name.is_attached());
}

/// Tests that a second handle under the same name replaces the first
#[rstest]
#[tokio::test]
async fn test_new_handle_replaces_entry(on_change_form: FormController) {
	let form = on_change_form;
	let first = MemoryInput::text("name");
	let second = MemoryInput::text("name");

	form.register(first.handle(), ValidationRules::new()).await.unwrap();
	form.register(second.handle(), ValidationRules::new()).await.unwrap();

	assert_eq!(form.field_names(), vec!["name".to_string()]);
	assert!(!first.is_attached());
	assert!(second.is_attached());
}

/// Tests that radio buttons sharing a name form one entry
#[rstest]
#[tokio::test]
async fn test_radio_options_share_one_entry() {
	let form = FormBuilder::new()
		.default_values(json!({"color": "blue"}))
		.build();
	let red = MemoryInput::radio("color", "red");
	let blue = MemoryInput::radio("color", "blue");

	form.register(red.handle(), ValidationRules::new()).await.unwrap();
	form.register(blue.handle(), ValidationRules::new()).await.unwrap();

	assert_eq!(form.field_names(), vec!["color".to_string()]);
	assert!(!red.is_checked());
	assert!(blue.is_checked());
	assert_eq!(form.get_values("color"), json!("blue"));

	form.set_value("color", json!("red"), SetValueOptions::default()).await;

	assert!(red.is_checked());
	assert!(!blue.is_checked());
	assert_eq!(form.get_values("color"), json!("red"));
}

/// Tests that a checkbox group reads as an array of checked values
#[rstest]
#[tokio::test]
async fn test_checkbox_group_values(on_change_form: FormController) {
	let form = on_change_form;
	let tags = ["rust", "go", "zig"].map(|tag| MemoryInput::checkbox("tags", tag));
	for tag in &tags {
		form.register(tag.handle(), ValidationRules::new()).await.unwrap();
	}

	tags[0].click(true).await;
	tags[2].click(true).await;

	assert_eq!(form.get_values("tags"), json!(["rust", "zig"]));
	assert!(form.form_state().is_field_dirty("tags"));
}

/// Tests that a handle without a name is rejected
#[rstest]
#[tokio::test]
async fn test_missing_name_is_rejected(on_change_form: FormController) {
	let form = on_change_form;
	let unnamed = MemoryInput::text("");

	let result = form.register(unnamed.handle(), ValidationRules::new()).await;

	assert!(matches!(result, Err(FormError::MissingName)));
	assert!(form.field_names().is_empty());
	assert!(!unnamed.is_attached());
}

/// Tests the `array[index].key` naming requirement for field-array members
#[rstest]
#[case("items[0]", false)]
#[case("items", false)]
#[case("items[0].title", true)]
#[case("other[0]", true)]
#[tokio::test]
async fn test_field_array_member_names(
	on_change_form: FormController,
	#[case] name: &str,
	#[case] accepted: bool,
) {
	let form = on_change_form;
	form.register_field_array("items");
	let input = MemoryInput::text(name);

	let result = form.register(input.handle(), ValidationRules::new()).await;

	assert_eq!(result.is_ok(), accepted);
	if !accepted {
		assert!(matches!(result, Err(FormError::MalformedFieldArrayName(n)) if n == name));
	}
}

/// Tests that an index too large for an array slot is stored as a key
#[rstest]
#[case("rows[18446744073709551615]", "18446744073709551615")]
#[case("rows[4000000000]", "4000000000")]
#[tokio::test]
async fn test_huge_index_name_reads_as_key(
	on_change_form: FormController,
	#[case] name: &str,
	#[case] key: &str,
) {
	let form = on_change_form;
	let row = MemoryInput::text_with(name, "x");
	form.register(row.handle(), ValidationRules::new()).await.unwrap();

	assert_eq!(form.get_values(FieldTarget::All), json!({"rows": {key: "x"}}));

	form.set_value(name, json!("y"), dirty()).await;

	assert_eq!(form.get_values(name), json!("y"));
}

// ============================================================================
// Category 2: Removal
// ============================================================================

/// Tests that unregistering drops dirty, touched and error bookkeeping
#[rstest]
#[tokio::test]
async fn test_unregister_removes_bookkeeping(on_change_form: FormController) {
	let form = on_change_form;
	let name = MemoryInput::text("name");
	let email = MemoryInput::text("email");
	form.register(name.handle(), ValidationRules::new().min_length(3, "Too short"))
		.await
		.unwrap();
	form.register(email.handle(), ValidationRules::new()).await.unwrap();

	name.input("ab").await;
	name.blur().await;
	let state = form.form_state();
	assert!(state.is_field_dirty("name"));
	assert!(state.is_field_touched("name"));
	assert!(state.errors.contains("name"));
	assert!(!state.is_valid);

	form.unregister("name").await;

	let state = form.form_state();
	assert!(!form.is_registered("name"));
	assert!(!state.is_dirty);
	assert_eq!(state.dirty_fields, json!({}));
	assert_eq!(state.touched, json!({}));
	assert!(state.errors.is_empty());
	assert!(state.is_valid);
	assert!(!name.is_attached());
	assert!(form.is_registered("email"));
}

/// Tests that unregistering every field empties the registry
#[rstest]
#[tokio::test]
async fn test_unregister_all(on_change_form: FormController) {
	let form = on_change_form;
	for name in ["a", "b", "c"] {
		let input = MemoryInput::text(name);
		form.register(input.handle(), ValidationRules::new()).await.unwrap();
	}

	form.unregister(FieldTarget::All).await;

	assert!(form.field_names().is_empty());
}

/// Tests removal of radio options through the removal observer
#[rstest]
#[tokio::test]
async fn test_removed_option_keeps_group() {
	let observer = ManualRemovalObserver::new();
	let form = FormBuilder::new()
		.removal_observer(observer.clone())
		.build();
	let red = MemoryInput::radio("color", "red");
	let blue = MemoryInput::radio("color", "blue");
	form.register(red.handle(), ValidationRules::new()).await.unwrap();
	form.register(blue.handle(), ValidationRules::new()).await.unwrap();
	assert_eq!(observer.observed_count(), 2);

	observer.remove(&red.handle()).await;

	assert!(form.is_registered("color"));
	assert!(!red.is_attached());
	assert!(blue.is_attached());

	observer.remove(&blue.handle()).await;

	assert!(!form.is_registered("color"));
	assert_eq!(observer.observed_count(), 0);
}

/// Tests that field-array members are only removed when forced
#[rstest]
#[tokio::test]
async fn test_field_array_member_survives_removal() {
	let observer = ManualRemovalObserver::new();
	let form = FormBuilder::new()
		.removal_observer(observer.clone())
		.build();
	form.register_field_array("items");
	let title = MemoryInput::text("items[0].title");
	form.register(title.handle(), ValidationRules::new()).await.unwrap();

	observer.remove(&title.handle()).await;
	assert!(form.is_registered("items[0].title"));

	form.unregister("items[0].title").await;
	assert!(!form.is_registered("items[0].title"));
}

/// Tests that registry names stay unique through any register/unregister order
#[rstest]
#[tokio::test]
async fn test_registry_uniqueness_through_churn(on_change_form: FormController) {
	let form = on_change_form;
	let names = ["a", "b", "a", "c", "b", "a"];
	for (step, name) in names.iter().enumerate() {
		let input = MemoryInput::text(name);
		form.register(input.handle(), ValidationRules::new()).await.unwrap();
		if step % 2 == 1 {
			form.unregister(*name).await;
		}
	}

	let registered = form.field_names();
	let mut unique = registered.clone();
	unique.sort();
	unique.dedup();
	assert_eq!(registered.len(), unique.len());
	assert_eq!(unique, vec!["b".to_string()]);
}

// ============================================================================
// Category 3: Shadow Store
// ============================================================================

/// Tests that a removed field keeps its value when configured to
#[rstest]
#[tokio::test]
async fn test_shadow_store_restores_value() {
	let observer = ManualRemovalObserver::new();
	let form = FormBuilder::new()
		.should_unregister(false)
		.removal_observer(observer.clone())
		.build();
	let name = MemoryInput::text("name");
	form.register(name.handle(), ValidationRules::new()).await.unwrap();
	form.set_value("name", json!("kept"), dirty()).await;

	observer.remove(&name.handle()).await;

	assert!(!form.is_registered("name"));
	assert_eq!(form.get_values(FieldTarget::All), json!({"name": "kept"}));
	assert!(form.form_state().is_field_dirty("name"));

	let again = MemoryInput::text("name");
	form.register(again.handle(), ValidationRules::new()).await.unwrap();

	assert_eq!(again.value(), json!("kept"));
}

/// Tests that values set on unknown names are kept in the shadow store
#[rstest]
#[tokio::test]
async fn test_set_value_without_field_is_shadowed() {
	let form = FormBuilder::new().should_unregister(false).build();

	form.set_value("draft.title", json!("Hello"), SetValueOptions::default())
		.await;

	assert_eq!(form.get_values("draft.title"), json!("Hello"));
	assert_eq!(
		form.get_values(FieldTarget::All),
		json!({"draft": {"title": "Hello"}})
	);
}

/// Tests that values of removed fields are dropped by default
#[rstest]
#[tokio::test]
async fn test_removed_value_dropped_by_default() {
	let observer = ManualRemovalObserver::new();
	let form = FormBuilder::new()
		.removal_observer(observer.clone())
		.build();
	let name = MemoryInput::text_with("name", "gone");
	form.register(name.handle(), ValidationRules::new()).await.unwrap();

	observer.remove(&name.handle()).await;

	assert_eq!(form.get_values(FieldTarget::All), json!({}));
}

// ============================================================================
// Category 4: Concurrency and Disposal
// ============================================================================

/// Tests that a field removed while its validation is pending has the
/// result discarded
#[rstest]
#[tokio::test]
async fn test_validation_result_discarded_after_removal() {
	let form = FormBuilder::new().build();
	let (release, released) = oneshot::channel::<()>();
	let released = Rc::new(RefCell::new(Some(released)));
	let rules = ValidationRules::new().validate(move |_value| {
		let released = released.borrow_mut().take();
		async move {
			if let Some(released) = released {
				let _ = released.await;
			}
			ValidateResult::Message("Rejected".to_string())
		}
	});
	let slow = MemoryInput::text("slow");
	form.register(slow.handle(), rules).await.unwrap();

	let mut pending = std::pin::pin!(form.trigger("slow"));
	assert!(futures::poll!(pending.as_mut()).is_pending());

	form.unregister("slow").await;
	release.send(()).unwrap();
	let valid = pending.await;

	assert!(!valid);
	assert!(form.form_state().errors.is_empty());
	assert!(!form.is_registered("slow"));
}

/// Tests that a dirty change made while another field validates survives
#[rstest]
#[tokio::test]
async fn test_overlapping_events_keep_dirty_fields(on_change_form: FormController) {
	let form = on_change_form;
	let (release, released) = oneshot::channel::<()>();
	let released = Rc::new(RefCell::new(Some(released)));
	let rules = ValidationRules::new().validate(move |value| {
		let gate = (value == json!("x"))
			.then(|| released.borrow_mut().take())
			.flatten();
		async move {
			if let Some(gate) = gate {
				let _ = gate.await;
			}
			ValidateResult::Valid
		}
	});
	let a = MemoryInput::text("a");
	let b = MemoryInput::text("b");
	form.register(a.handle(), rules).await.unwrap();
	form.register(b.handle(), ValidationRules::new()).await.unwrap();

	let mut pending = std::pin::pin!(a.input("x"));
	assert!(futures::poll!(pending.as_mut()).is_pending());
	b.input("y").await;
	assert_eq!(form.form_state().dirty_fields, json!({"b": true}));

	release.send(()).unwrap();
	pending.await;

	let state = form.form_state();
	assert_eq!(state.dirty_fields, json!({"a": true, "b": true}));
	assert!(state.is_dirty);
	assert_eq!(form.get_values("b"), json!("y"));
}

/// Tests that a slow result for an outdated value does not overwrite the
/// result for the current value
#[rstest]
#[tokio::test]
async fn test_outdated_validation_result_discarded(on_change_form: FormController) {
	let form = on_change_form;
	let (release, released) = oneshot::channel::<()>();
	let released = Rc::new(RefCell::new(Some(released)));
	let rules = ValidationRules::new()
		.required("Required")
		.validate(move |value| {
			let gate = (value == json!("bad"))
				.then(|| released.borrow_mut().take())
				.flatten();
			async move {
				match gate {
					Some(gate) => {
						let _ = gate.await;
						ValidateResult::Message("Rejected".to_string())
					}
					None => ValidateResult::Valid,
				}
			}
		});
	let a = MemoryInput::text("a");
	form.register(a.handle(), rules).await.unwrap();

	let mut pending = std::pin::pin!(a.input("bad"));
	assert!(futures::poll!(pending.as_mut()).is_pending());
	a.input("good").await;
	assert!(form.form_state().is_valid);

	release.send(()).unwrap();
	pending.await;

	let state = form.form_state();
	assert_eq!(form.get_values("a"), json!("good"));
	assert!(!state.errors.contains("a"));
	assert!(state.is_valid);
}

/// Tests that `trigger` ignores a result computed for an outdated value
#[rstest]
#[tokio::test]
async fn test_trigger_result_discarded_after_value_change() {
	let form = FormBuilder::new().build();
	let (release, released) = oneshot::channel::<()>();
	let released = Rc::new(RefCell::new(Some(released)));
	let rules = ValidationRules::new().validate(move |_value| {
		let released = released.borrow_mut().take();
		async move {
			if let Some(released) = released {
				let _ = released.await;
				return ValidateResult::Message("Rejected".to_string());
			}
			ValidateResult::Valid
		}
	});
	let a = MemoryInput::text("a");
	form.register(a.handle(), rules).await.unwrap();

	let mut pending = std::pin::pin!(form.trigger("a"));
	assert!(futures::poll!(pending.as_mut()).is_pending());
	form.set_value("a", json!("changed"), SetValueOptions::default().should_validate(true))
		.await;

	release.send(()).unwrap();
	let valid = pending.await;

	assert!(valid);
	assert!(form.form_state().errors.is_empty());
}

/// Tests that a disposed form detaches handles and refuses registration
#[rstest]
#[tokio::test]
async fn test_dispose_detaches_everything(on_change_form: FormController) {
	let form = on_change_form;
	let name = MemoryInput::text("name");
	form.register(name.handle(), ValidationRules::new()).await.unwrap();
	let renders = Rc::new(RefCell::new(0));
	let counter = renders.clone();
	let state = form.subscribe(move || *counter.borrow_mut() += 1);
	assert!(!state.is_dirty());

	form.dispose();
	name.input("after").await;
	form.set_value("name", json!("later"), dirty()).await;

	assert!(form.is_disposed());
	assert!(!name.is_attached());
	assert_eq!(*renders.borrow(), 0);
	let late = MemoryInput::text("late");
	let result = form.register(late.handle(), ValidationRules::new()).await;
	assert!(matches!(result, Err(FormError::Disposed)));
}
