//! Validation orchestration
//!
//! Rule validation and resolver validation both end in
//! [`FormController::reconcile`], which decides whether an outcome is worth
//! publishing.

use super::FormController;
use crate::error::{FieldError, FieldErrors};
use crate::resolver::Resolver;
use crate::rules;
use crate::state::FormStatePatch;
use crate::target::FieldTarget;
use futures::future::join_all;
use reinhardt_form_path as path;
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

/// Whether a validation outcome for `name` changes anything observable.
///
/// A field that stays valid and was already known valid never re-renders.
pub(crate) fn should_render_based_on_error(
	errors: &FieldErrors,
	name: &str,
	error: Option<&FieldError>,
	valid_fields: &HashSet<String>,
	fields_with_rules: &HashSet<String>,
) -> bool {
	let field_valid = error.is_none();
	let form_valid = errors.is_empty();
	let previous = errors.get(name);

	if field_valid && valid_fields.contains(name) {
		return false;
	}
	if form_valid != field_valid
		|| (!form_valid && previous.is_none())
		|| (field_valid && fields_with_rules.contains(name) && !valid_fields.contains(name))
	{
		return true;
	}
	match (previous, error) {
		(Some(previous), Some(error)) => !previous.is_same(error),
		(None, None) => false,
		_ => true,
	}
}

impl FormController {
	/// Run the resolver over defaults merged with current values and
	/// publish `is_valid` when it flipped.
	pub(crate) async fn validate_resolver_validity(&self) {
		let Some(resolver) = self.core.resolver.clone() else {
			return;
		};
		let merged = || {
			let inner = self.core.inner.borrow();
			let mut values = inner.default_values.clone();
			path::deep_merge(&mut values, inner.values());
			values
		};
		let values = merged();

		let result = resolver
			.resolve(&values, self.core.options.context.as_ref(), self.criteria())
			.await;
		if merged() != values {
			tracing::debug!("values changed during resolver validation, verdict discarded");
			return;
		}
		let is_valid = result.errors.is_empty();
		if self.core.store.read(|s| s.is_valid) != is_valid {
			self.core.store.publish(FormStatePatch {
				is_valid: Some(is_valid),
				..Default::default()
			});
		}
	}

	/// Validate one field against its rules and reconcile the outcome.
	///
	/// Returns whether the field is free of errors.
	pub(crate) async fn validate_one(&self, name: &str) -> bool {
		let Some((rules, value, handle)) = self.rule_input(name) else {
			return false;
		};
		let error = rules::validate_value(&value, &rules, self.criteria())
			.await
			.map(|error| error.with_ref(handle));
		let valid = error.is_none();

		if !self.is_registered(name) {
			tracing::debug!(field = %name, "field removed during validation, result discarded");
			return valid;
		}
		if !self.holds_value(name, &value) {
			tracing::debug!(field = %name, "value changed during validation, result discarded");
			return self.core.store.read(|s| !s.errors.contains(name));
		}
		if let Some(patch) = self.reconcile(name, error, false, None, None) {
			self.core.store.publish(patch);
		}
		valid
	}

	async fn resolve_fields(&self, resolver: Rc<dyn Resolver>, names: Vec<String>, single: bool) -> bool {
		let (values, registered) = {
			let inner = self.core.inner.borrow();
			(inner.values(), inner.fields.names().into_iter().collect::<BTreeSet<_>>())
		};
		let result = resolver
			.resolve(&values, self.core.options.context.as_ref(), self.criteria())
			.await;
		let current = self.values();
		let form_valid = if current == values {
			result.errors.is_empty()
		} else {
			self.core.store.read(|s| s.is_valid)
		};
		let removed_since = |name: &str| registered.contains(name) && !self.is_registered(name);
		let changed_since = |name: &str| path::get(&current, name) != path::get(&values, name);

		if single {
			let Some(name) = names.first() else {
				return form_valid;
			};
			let error = result
				.errors
				.get(name)
				.cloned()
				.map(|error| error.with_ref(self.primary_handle(name)));
			let valid = error.is_none();
			if removed_since(name) {
				tracing::debug!(field = %name, "field removed during validation, result discarded");
				return valid;
			}
			if changed_since(name) {
				tracing::debug!(field = %name, "value changed during validation, result discarded");
				return self.core.store.read(|s| !s.errors.contains(name));
			}
			let was_valid = self.core.store.read(|s| s.is_valid);
			if let Some(patch) =
				self.reconcile(name, error, was_valid != form_valid, None, Some(form_valid))
			{
				self.core.store.publish(patch);
			}
			return valid;
		}

		let mut errors = self.core.store.read(|s| s.errors.clone());
		let mut all_valid = true;
		for name in &names {
			if removed_since(name) {
				continue;
			}
			if changed_since(name) {
				all_valid &= !errors.contains(name);
				continue;
			}
			match result.errors.get(name) {
				Some(error) => {
					errors.insert(name.clone(), error.clone().with_ref(self.primary_handle(name)));
					all_valid = false;
				}
				None => errors.remove(name),
			}
		}
		self.core.store.publish(FormStatePatch {
			is_valid: Some(form_valid),
			errors: Some(errors),
			..Default::default()
		});
		all_valid
	}

	/// Validate a field, several fields or the whole form on demand
	///
	/// Returns `true` when every targeted field is free of errors.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::memory::MemoryInput;
	/// use reinhardt_form_control::{FieldTarget, FormBuilder, ValidationRules};
	///
	/// # futures::executor::block_on(async {
	/// let form = FormBuilder::new().build();
	/// let name = MemoryInput::text("name");
	/// form.register(name.handle(), ValidationRules::new().required("Required"))
	/// 	.await
	/// 	.unwrap();
	///
	/// assert!(!form.trigger("name").await);
	/// assert!(form.form_state().errors.contains("name"));
	/// assert!(!form.trigger(FieldTarget::All).await);
	/// # });
	/// ```
	pub async fn trigger(&self, target: impl Into<FieldTarget>) -> bool {
		let (names, single) = match target.into() {
			FieldTarget::All => (self.field_names(), false),
			FieldTarget::One(name) => (vec![name], true),
			FieldTarget::Many(names) => (names, false),
		};
		tracing::trace!(fields = ?names, "trigger validation");

		if let Some(resolver) = self.core.resolver.clone() {
			return self.resolve_fields(resolver, names, single).await;
		}

		if single {
			return match names.first() {
				Some(name) => self.validate_one(name).await,
				None => true,
			};
		}

		let results = join_all(names.iter().map(|name| self.validate_one(name))).await;
		self.rerender();
		results.into_iter().all(|valid| valid)
	}

	/// Fold one field's validation outcome into the error map and return the
	/// patch to publish when the outcome is observable.
	///
	/// `resolver_valid` carries the resolver's whole-form verdict; without
	/// it validity comes from the rule bookkeeping.
	pub(crate) fn reconcile(
		&self,
		name: &str,
		error: Option<FieldError>,
		force_render: bool,
		dirty: Option<FormStatePatch>,
		resolver_valid: Option<bool>,
	) -> Option<FormStatePatch> {
		let mut guard = self.core.inner.borrow_mut();
		let inner = &mut *guard;
		let mut errors = self.core.store.read(|s| s.errors.clone());
		let mut should_render = force_render
			|| should_render_based_on_error(
				&errors,
				name,
				error.as_ref(),
				&inner.valid_fields,
				&inner.fields_with_rules,
			);
		let previous = errors.get(name).cloned();

		match error {
			None => {
				if inner.fields_with_rules.contains(name) || self.core.resolver.is_some() {
					inner.valid_fields.insert(name.to_string());
					should_render |= previous.is_some();
				}
				errors.remove(name);
			}
			Some(error) => {
				inner.valid_fields.remove(name);
				should_render |= previous.is_none_or(|previous| !previous.is_same(&error));
				errors.insert(name, error);
			}
		}

		if !should_render && dirty.is_none() {
			return None;
		}
		let is_valid = resolver_valid.unwrap_or_else(|| inner.rule_validity(&errors));
		Some(dirty.unwrap_or_default().merge(FormStatePatch {
			errors: Some(errors),
			is_valid: Some(is_valid),
			..Default::default()
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn set(names: &[&str]) -> HashSet<String> {
		names.iter().map(|name| name.to_string()).collect()
	}

	fn required() -> FieldError {
		FieldError::new("required", "Required")
	}

	#[rstest]
	fn test_valid_known_field_does_not_render() {
		let errors = FieldErrors::new();

		assert!(!should_render_based_on_error(
			&errors,
			"name",
			None,
			&set(&["name"]),
			&set(&["name"]),
		));
	}

	#[rstest]
	fn test_first_valid_outcome_of_rule_field_renders() {
		let errors = FieldErrors::new();

		assert!(should_render_based_on_error(
			&errors,
			"name",
			None,
			&set(&[]),
			&set(&["name"]),
		));
	}

	#[rstest]
	fn test_new_error_on_valid_form_renders() {
		let errors = FieldErrors::new();

		assert!(should_render_based_on_error(
			&errors,
			"name",
			Some(&required()),
			&set(&[]),
			&set(&["name"]),
		));
	}

	#[rstest]
	#[case(FieldError::new("required", "Required"), false)]
	#[case(FieldError::new("required", "Still required"), true)]
	#[case(FieldError::new("minLength", "Too short"), true)]
	fn test_repeated_error_renders_only_when_changed(
		#[case] next: FieldError,
		#[case] expected: bool,
	) {
		let mut errors = FieldErrors::new();
		errors.insert("name", required());

		assert_eq!(
			should_render_based_on_error(&errors, "name", Some(&next), &set(&[]), &set(&["name"])),
			expected
		);
	}
}
