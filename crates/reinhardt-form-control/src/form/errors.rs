//! Manual error management

use super::FormController;
use crate::error::{ErrorOption, FieldError, FieldErrors};
use crate::state::FormStatePatch;
use crate::target::FieldTarget;

impl FormController {
	/// Remove errors for the targeted fields, or every error
	pub fn clear_errors(&self, target: impl Into<FieldTarget>) {
		let errors = match target.into() {
			FieldTarget::All => FieldErrors::new(),
			target => {
				let mut errors = self.core.store.read(|s| s.errors.clone());
				for name in target.names() {
					errors.remove(&name);
				}
				errors
			}
		};
		self.core.store.publish(FormStatePatch {
			errors: Some(errors),
			..Default::default()
		});
	}

	/// Set an error on a field by hand
	///
	/// The form becomes invalid until the error is cleared or replaced by a
	/// validation outcome.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::{ErrorOption, FormBuilder};
	///
	/// let form = FormBuilder::new().build();
	/// form.set_error("email", ErrorOption::new("server").message("Already taken"));
	///
	/// let state = form.form_state();
	/// assert!(!state.is_valid);
	/// assert_eq!(state.errors.get("email").map(|e| e.message.as_str()), Some("Already taken"));
	/// ```
	pub fn set_error(&self, name: &str, option: ErrorOption) {
		let ErrorOption {
			error_type,
			message,
			should_focus,
		} = option;
		let handle = self.primary_handle(name);
		let mut errors = self.core.store.read(|s| s.errors.clone());
		errors.insert(name, FieldError::new(error_type, message).with_ref(handle.clone()));

		tracing::debug!(field = %name, "error set manually");
		self.core.store.publish(FormStatePatch {
			is_valid: Some(false),
			errors: Some(errors),
			..Default::default()
		});

		if should_focus {
			if let Some(handle) = handle {
				self.core.focus.focus(&handle);
			}
		}
	}
}
