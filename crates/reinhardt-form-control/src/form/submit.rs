//! Submission

use super::FormController;
use crate::error::FieldErrors;
use crate::rules;
use crate::state::FormStatePatch;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;

/// Which callback a submission ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// Validation passed and the valid callback ran
	Submitted,
	/// Validation failed; the invalid callback (if any) ran
	Rejected,
}

impl FormController {
	/// Validate the whole form and hand the values to `on_valid`
	///
	/// See [`FormController::handle_submit_with`].
	pub async fn handle_submit<F, Fut, E>(&self, on_valid: F) -> Result<SubmitOutcome, E>
	where
		F: FnOnce(Value) -> Fut,
		Fut: Future<Output = Result<(), E>>,
	{
		self.handle_submit_with(on_valid, |_errors: FieldErrors| async { Ok(()) })
			.await
	}

	/// Validate the whole form, then run `on_valid` with the values or
	/// `on_invalid` with the errors
	///
	/// `is_submitting` is set for the duration. Afterwards `is_submitted`
	/// is set and `submit_count` incremented even when a callback fails;
	/// the callback's error is returned after that bookkeeping.
	///
	/// With `should_focus_error` the first registered field with an error is
	/// focused before `on_invalid` runs.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::memory::MemoryInput;
	/// use reinhardt_form_control::{FormBuilder, SubmitOutcome, ValidationRules};
	/// use serde_json::json;
	///
	/// # futures::executor::block_on(async {
	/// let form = FormBuilder::new().build();
	/// let name = MemoryInput::text_with("name", "Ada");
	/// form.register(name.handle(), ValidationRules::new().required("Required"))
	/// 	.await
	/// 	.unwrap();
	///
	/// let outcome = form
	/// 	.handle_submit(|values| async move {
	/// 		assert_eq!(values, json!({"name": "Ada"}));
	/// 		Ok::<_, std::convert::Infallible>(())
	/// 	})
	/// 	.await;
	///
	/// assert_eq!(outcome, Ok(SubmitOutcome::Submitted));
	/// assert_eq!(form.form_state().submit_count, 1);
	/// # });
	/// ```
	pub async fn handle_submit_with<F, Fut, G, GFut, E>(
		&self,
		on_valid: F,
		on_invalid: G,
	) -> Result<SubmitOutcome, E>
	where
		F: FnOnce(Value) -> Fut,
		Fut: Future<Output = Result<(), E>>,
		G: FnOnce(FieldErrors) -> GFut,
		GFut: Future<Output = Result<(), E>>,
	{
		let mut values = self.values();
		self.core.store.publish(FormStatePatch {
			is_submitting: Some(true),
			..Default::default()
		});
		tracing::debug!("submitting form");

		let mut errors = self.core.store.read(|s| s.errors.clone());
		let field_errors = match self.core.resolver.clone() {
			Some(resolver) => {
				let result = resolver
					.resolve(&values, self.core.options.context.as_ref(), self.criteria())
					.await;
				values = result.values;
				let field_errors: FieldErrors = result
					.errors
					.into_iter()
					.map(|(name, error)| {
						let handle = self.primary_handle(&name);
						(name, error.with_ref(handle))
					})
					.collect();
				errors = field_errors.clone();
				field_errors
			}
			None => self.validate_for_submit(&mut errors).await,
		};

		let registered: HashSet<String> = self.field_names().into_iter().collect();
		let is_valid =
			field_errors.is_empty() && errors.names().all(|name| registered.contains(name));

		let outcome = if is_valid {
			self.core.store.publish(FormStatePatch {
				errors: Some(FieldErrors::new()),
				..Default::default()
			});
			let result = on_valid(values).await.map(|()| SubmitOutcome::Submitted);
			errors = self.core.store.read(|s| s.errors.clone());
			result
		} else {
			tracing::debug!(errors = field_errors.len(), "submission rejected");
			errors.merge(field_errors.clone());
			if self.core.options.should_focus_error {
				self.focus_first_error(&field_errors);
			}
			on_invalid(errors.clone()).await.map(|()| SubmitOutcome::Rejected)
		};

		let submit_count = self.core.store.read(|s| s.submit_count) + 1;
		self.core.store.publish(FormStatePatch {
			is_submitted: Some(true),
			is_submitting: Some(false),
			errors: Some(errors),
			submit_count: Some(submit_count),
			..Default::default()
		});
		outcome
	}

	/// Validate every registered field in registration order.
	///
	/// Clears errors of rule-bound fields that now pass and returns the
	/// errors found.
	async fn validate_for_submit(&self, errors: &mut FieldErrors) -> FieldErrors {
		let mut field_errors = FieldErrors::new();
		for name in self.field_names() {
			let Some((rules, value, handle)) = self.rule_input(&name) else {
				continue;
			};
			let error = rules::validate_value(&value, &rules, self.criteria()).await;

			let mut inner = self.core.inner.borrow_mut();
			if !inner.fields.contains(&name) {
				continue;
			}
			match error {
				Some(error) => {
					inner.valid_fields.remove(&name);
					field_errors.insert(name, error.with_ref(handle));
				}
				None if inner.fields_with_rules.contains(&name) => {
					errors.remove(&name);
					inner.valid_fields.insert(name);
				}
				None => {}
			}
		}
		field_errors
	}

	fn focus_first_error(&self, errors: &FieldErrors) {
		let handle = self
			.core
			.inner
			.borrow()
			.fields
			.iter()
			.find(|(name, _)| errors.contains(name))
			.and_then(|(_, entry)| entry.primary_handle());
		if let Some(handle) = handle {
			tracing::debug!(field = %handle.name(), "focusing first invalid field");
			self.core.focus.focus(&handle);
		}
	}
}
