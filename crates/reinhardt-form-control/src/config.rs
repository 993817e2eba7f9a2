//! Form configuration
//!
//! [`FormOptions`] holds the serializable settings and can be loaded from any
//! serde source using camelCase keys. [`FormBuilder`] adds the collaborators
//! that cannot be serialized (resolver, removal observer, focus manager) and
//! builds the [`FormController`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_form_control::{FormBuilder, FormOptions, ValidationMode};
//! use serde_json::json;
//!
//! let options: FormOptions = serde_json::from_value(json!({
//! 	"mode": "onBlur",
//! 	"defaultValues": {"email": "a@example.com"},
//! }))
//! .unwrap();
//! assert_eq!(options.mode, ValidationMode::OnBlur);
//! assert!(options.should_unregister);
//!
//! let form = FormBuilder::from_options(options).build();
//! assert_eq!(form.get_values("email"), json!("a@example.com"));
//! ```

use crate::form::FormController;
use crate::handle::{FocusManager, RemovalObserver};
use crate::resolver::Resolver;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

/// When field events trigger validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
	#[default]
	OnSubmit,
	OnBlur,
	OnChange,
	OnTouched,
	All,
}

impl ValidationMode {
	pub fn flags(self) -> ModeFlags {
		ModeFlags {
			is_on_submit: self == ValidationMode::OnSubmit,
			is_on_blur: self == ValidationMode::OnBlur,
			is_on_change: self == ValidationMode::OnChange,
			is_on_touched: self == ValidationMode::OnTouched,
			is_on_all: self == ValidationMode::All,
		}
	}
}

/// Boolean view of a [`ValidationMode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
	pub is_on_submit: bool,
	pub is_on_blur: bool,
	pub is_on_change: bool,
	pub is_on_touched: bool,
	pub is_on_all: bool,
}

/// How many rule failures are collected per field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriteriaMode {
	#[default]
	FirstError,
	All,
}

/// Whether a change or blur event skips validation
///
/// # Arguments
///
/// - `mode`: flags of the form's validation mode
/// - `re_validate`: flags of the re-validation mode used after a submit
/// - `is_blur`: the event is a blur
/// - `is_submitted`: the form has been submitted at least once
/// - `is_touched`: the field was blurred before
///
/// # Examples
///
/// ```
/// use reinhardt_form_control::ValidationMode;
/// use reinhardt_form_control::config::should_skip_validation;
///
/// let on_blur = ValidationMode::OnBlur.flags();
/// let on_change = ValidationMode::OnChange.flags();
/// assert!(should_skip_validation(on_blur, on_change, false, false, false));
/// assert!(!should_skip_validation(on_blur, on_change, true, false, false));
/// // after the first submit the re-validation mode decides
/// assert!(!should_skip_validation(on_blur, on_change, false, true, false));
/// ```
pub fn should_skip_validation(
	mode: ModeFlags,
	re_validate: ModeFlags,
	is_blur: bool,
	is_submitted: bool,
	is_touched: bool,
) -> bool {
	if mode.is_on_all {
		return false;
	}
	if !is_submitted && mode.is_on_touched {
		return !(is_touched || is_blur);
	}
	let on_blur = if is_submitted {
		re_validate.is_on_blur
	} else {
		mode.is_on_blur
	};
	if on_blur {
		return !is_blur;
	}
	let on_change = if is_submitted {
		re_validate.is_on_change
	} else {
		mode.is_on_change
	};
	if on_change {
		return is_blur;
	}
	true
}

/// Serializable form settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormOptions {
	pub mode: ValidationMode,
	pub re_validate_mode: ValidationMode,
	pub default_values: Value,
	pub context: Option<Value>,
	pub criteria_mode: CriteriaMode,
	pub should_focus_error: bool,
	pub should_unregister: bool,
}

impl Default for FormOptions {
	fn default() -> Self {
		Self {
			mode: ValidationMode::OnSubmit,
			re_validate_mode: ValidationMode::OnChange,
			default_values: Value::Object(Default::default()),
			context: None,
			criteria_mode: CriteriaMode::FirstError,
			should_focus_error: true,
			should_unregister: true,
		}
	}
}

/// Builder for [`FormController`]
///
/// # Examples
///
/// ```
/// use reinhardt_form_control::{CriteriaMode, FormBuilder, ValidationMode};
/// use serde_json::json;
///
/// let form = FormBuilder::new()
/// 	.mode(ValidationMode::OnChange)
/// 	.criteria_mode(CriteriaMode::All)
/// 	.default_values(json!({"name": "Alice"}))
/// 	.build();
/// assert!(form.form_state().is_valid);
/// ```
#[derive(Default)]
pub struct FormBuilder {
	pub(crate) options: FormOptions,
	pub(crate) resolver: Option<Rc<dyn Resolver>>,
	pub(crate) removal_observer: Option<Rc<dyn RemovalObserver>>,
	pub(crate) focus_manager: Option<Rc<dyn FocusManager>>,
}

impl FormBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_options(options: FormOptions) -> Self {
		Self {
			options,
			..Self::default()
		}
	}

	pub fn mode(mut self, mode: ValidationMode) -> Self {
		self.options.mode = mode;
		self
	}

	pub fn re_validate_mode(mut self, mode: ValidationMode) -> Self {
		self.options.re_validate_mode = mode;
		self
	}

	pub fn default_values(mut self, values: Value) -> Self {
		self.options.default_values = values;
		self
	}

	/// Context value handed to the resolver on every call
	pub fn context(mut self, context: Value) -> Self {
		self.options.context = Some(context);
		self
	}

	pub fn criteria_mode(mut self, criteria: CriteriaMode) -> Self {
		self.options.criteria_mode = criteria;
		self
	}

	pub fn should_focus_error(mut self, enabled: bool) -> Self {
		self.options.should_focus_error = enabled;
		self
	}

	/// When `false`, values of removed fields are kept in the shadow store
	pub fn should_unregister(mut self, enabled: bool) -> Self {
		self.options.should_unregister = enabled;
		self
	}

	/// Validate the whole form with `resolver` instead of per-field rules
	pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
		self.resolver = Some(Rc::new(resolver));
		self
	}

	pub fn removal_observer(mut self, observer: Rc<dyn RemovalObserver>) -> Self {
		self.removal_observer = Some(observer);
		self
	}

	pub fn focus_manager(mut self, focus: Rc<dyn FocusManager>) -> Self {
		self.focus_manager = Some(focus);
		self
	}

	pub fn build(self) -> FormController {
		FormController::from_builder(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_options_defaults() {
		let options: FormOptions = serde_json::from_value(json!({})).unwrap();

		assert_eq!(options, FormOptions::default());
		assert_eq!(options.mode, ValidationMode::OnSubmit);
		assert_eq!(options.re_validate_mode, ValidationMode::OnChange);
		assert!(options.should_focus_error);
	}

	#[rstest]
	fn test_options_camel_case_keys() {
		let options: FormOptions = serde_json::from_value(json!({
			"mode": "onTouched",
			"reValidateMode": "onBlur",
			"criteriaMode": "all",
			"shouldFocusError": false,
			"shouldUnregister": false,
			"context": {"locale": "en"},
		}))
		.unwrap();

		assert_eq!(options.mode, ValidationMode::OnTouched);
		assert_eq!(options.re_validate_mode, ValidationMode::OnBlur);
		assert_eq!(options.criteria_mode, CriteriaMode::All);
		assert!(!options.should_focus_error);
		assert!(!options.should_unregister);
		assert_eq!(options.context, Some(json!({"locale": "en"})));
	}

	#[rstest]
	// all never skips
	#[case(ValidationMode::All, false, false, false, false)]
	#[case(ValidationMode::All, true, false, false, false)]
	// onTouched waits for the first blur
	#[case(ValidationMode::OnTouched, false, false, false, true)]
	#[case(ValidationMode::OnTouched, true, false, false, false)]
	#[case(ValidationMode::OnTouched, false, false, true, false)]
	// onBlur / onChange
	#[case(ValidationMode::OnBlur, false, false, false, true)]
	#[case(ValidationMode::OnBlur, true, false, false, false)]
	#[case(ValidationMode::OnChange, false, false, false, false)]
	#[case(ValidationMode::OnChange, true, false, false, true)]
	// onSubmit skips until submitted, then follows reValidateMode (onChange)
	#[case(ValidationMode::OnSubmit, false, false, false, true)]
	#[case(ValidationMode::OnSubmit, false, true, false, false)]
	#[case(ValidationMode::OnSubmit, true, true, false, true)]
	fn test_should_skip_validation(
		#[case] mode: ValidationMode,
		#[case] is_blur: bool,
		#[case] is_submitted: bool,
		#[case] is_touched: bool,
		#[case] expected: bool,
	) {
		let skip = should_skip_validation(
			mode.flags(),
			ValidationMode::OnChange.flags(),
			is_blur,
			is_submitted,
			is_touched,
		);

		assert_eq!(skip, expected);
	}
}
