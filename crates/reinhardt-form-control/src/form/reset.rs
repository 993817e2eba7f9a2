//! Resetting the form

use super::{FormController, FormInner};
use crate::accessor::{read_entry, write_entry};
use crate::error::FieldErrors;
use crate::state::{FormStatePatch, empty_tree};
use futures::future::join_all;
use reinhardt_form_path as path;
use serde_json::Value;
use std::rc::Rc;

/// State slices preserved across [`FormController::reset`]
///
/// Every flag defaults to `false`, meaning the slice is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepStateOptions {
	pub errors: bool,
	pub is_dirty: bool,
	pub is_submitted: bool,
	pub touched: bool,
	pub is_valid: bool,
	pub submit_count: bool,
	pub dirty_fields: bool,
}

impl FormController {
	/// Restore every field to its default value
	///
	/// `values` replaces the configured default values. Fields keep their
	/// bindings; their dirty-tracking baselines are recaptured from the
	/// written values. Outside `on_submit` mode validity is seeded again.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::memory::MemoryInput;
	/// use reinhardt_form_control::{FormBuilder, InputHandle, KeepStateOptions, ValidationRules};
	/// use serde_json::json;
	///
	/// # futures::executor::block_on(async {
	/// let form = FormBuilder::new().build();
	/// let name = MemoryInput::text("name");
	/// form.register(name.handle(), ValidationRules::new()).await.unwrap();
	///
	/// form.reset(Some(json!({"name": "Grace"})), KeepStateOptions::default()).await;
	///
	/// assert_eq!(name.value(), json!("Grace"));
	/// assert!(!form.form_state().is_dirty);
	/// # });
	/// ```
	pub async fn reset(&self, values: Option<Value>, keep: KeepStateOptions) {
		let has_values = values.is_some();
		let array_resets = {
			let mut guard = self.core.inner.borrow_mut();
			let inner = &mut *guard;
			if let Some(values) = &values {
				inner.default_values = values.clone();
			}
			inner.shadow = match values {
				Some(values) if !self.core.options.should_unregister => values,
				_ => empty_tree(),
			};

			let previous = std::mem::take(&mut inner.defaults_at_render);
			let names = inner.fields.names();
			for name in &names {
				let Some(entry) = inner.fields.get(name) else {
					continue;
				};
				let target = path::get_defined(&inner.default_values, name)
					.or_else(|| previous.get(name));
				if let Some(target) = target {
					write_entry(entry, target);
				}
				if inner.is_in_field_array(name) && target.is_none() {
					continue;
				}
				let baseline = read_entry(entry);
				inner.defaults_at_render.insert(name.clone(), baseline);
			}
			inner.field_array_defaults.clear();

			if !keep.is_valid {
				let view: &FormInner = inner;
				let tracked = view
					.fields
					.iter()
					.filter(|(name, entry)| self.tracks_rules(view, name, &entry.rules))
					.map(|(name, _)| name.clone())
					.collect();
				inner.fields_with_rules = tracked;
				inner.valid_fields.clear();
			}

			inner
				.field_array_resets
				.values()
				.cloned()
				.collect::<Vec<Rc<dyn Fn()>>>()
		};

		self.core.watches.clear_host();
		if has_values {
			self.core.watches.hook_notifications("").fire();
		}
		for reset_array in array_resets {
			reset_array();
		}

		let state = self.core.store.snapshot();
		self.core.store.publish(FormStatePatch {
			is_dirty: Some(keep.is_dirty && state.is_dirty),
			dirty_fields: Some(if keep.dirty_fields {
				state.dirty_fields
			} else {
				empty_tree()
			}),
			touched: Some(if keep.touched {
				state.touched
			} else {
				empty_tree()
			}),
			is_submitted: Some(keep.is_submitted && state.is_submitted),
			submit_count: Some(if keep.submit_count {
				state.submit_count
			} else {
				0
			}),
			is_valid: Some(!keep.is_valid || state.is_valid),
			errors: Some(if keep.errors {
				state.errors
			} else {
				FieldErrors::new()
			}),
			is_submitting: Some(false),
		});
		tracing::debug!(with_values = has_values, "form reset");

		if !keep.is_valid && !self.core.mode.is_on_submit {
			self.seed_validity().await;
		}
	}

	/// Seed `is_valid` for every field, as registration does.
	async fn seed_validity(&self) {
		if self.core.resolver.is_some() {
			self.validate_resolver_validity().await;
		}
		let names: Vec<String> = {
			let inner = self.core.inner.borrow();
			inner
				.fields
				.names()
				.into_iter()
				.filter(|name| inner.fields_with_rules.contains(name))
				.collect()
		};
		join_all(names.iter().map(|name| self.seed_field(name))).await;
	}
}
