//! Built-in field validation rules
//!
//! A [`ValidationRules`] value bundles the constraints of one field. Rules are
//! evaluated in a fixed order: `required`, `min`/`max`, `minLength`/
//! `maxLength`, `pattern`, then custom validators. With
//! [`CriteriaMode::FirstError`] evaluation stops at the first failure; with
//! [`CriteriaMode::All`] every failure is recorded in [`FieldError::types`]
//! and the last failing rule determines the reported type and message.
//!
//! ## Example
//!
//! ```
//! use reinhardt_form_control::{Bound, ValidationRules};
//!
//! let rules = ValidationRules::new()
//! 	.required("Age is required")
//! 	.min(Bound::Number(18.0), "Must be an adult");
//! assert!(!rules.is_empty());
//! ```

use crate::config::CriteriaMode;
use crate::error::{ErrorType, FieldError};
use chrono::NaiveDate;
use futures::future::LocalBoxFuture;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Outcome of a custom validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateResult {
	Valid,
	/// Failed without a message
	Invalid,
	/// Failed with the given message
	Message(String),
}

impl From<bool> for ValidateResult {
	fn from(valid: bool) -> Self {
		if valid {
			ValidateResult::Valid
		} else {
			ValidateResult::Invalid
		}
	}
}

impl From<&str> for ValidateResult {
	fn from(message: &str) -> Self {
		ValidateResult::Message(message.to_string())
	}
}

impl From<String> for ValidateResult {
	fn from(message: String) -> Self {
		ValidateResult::Message(message)
	}
}

pub type ValidatorFn = Rc<dyn Fn(Value) -> LocalBoxFuture<'static, ValidateResult>>;

/// A rule value with the message reported when it fails
#[derive(Debug, Clone)]
pub struct Rule<T> {
	pub value: T,
	pub message: String,
}

/// Lower or upper bound for `min`/`max`
///
/// Dates compare against values in `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
	Number(f64),
	Date(NaiveDate),
}

/// Validation constraints for one field
#[derive(Clone, Default)]
pub struct ValidationRules {
	pub required: Option<String>,
	pub min: Option<Rule<Bound>>,
	pub max: Option<Rule<Bound>>,
	pub min_length: Option<Rule<usize>>,
	pub max_length: Option<Rule<usize>>,
	pub pattern: Option<Rule<Regex>>,
	pub validate: Vec<(ErrorType, ValidatorFn)>,
}

impl ValidationRules {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.required.is_none()
			&& self.min.is_none()
			&& self.max.is_none()
			&& self.min_length.is_none()
			&& self.max_length.is_none()
			&& self.pattern.is_none()
			&& self.validate.is_empty()
	}

	pub fn required(mut self, message: impl Into<String>) -> Self {
		self.required = Some(message.into());
		self
	}

	pub fn min(mut self, bound: Bound, message: impl Into<String>) -> Self {
		self.min = Some(Rule {
			value: bound,
			message: message.into(),
		});
		self
	}

	pub fn max(mut self, bound: Bound, message: impl Into<String>) -> Self {
		self.max = Some(Rule {
			value: bound,
			message: message.into(),
		});
		self
	}

	pub fn min_length(mut self, length: usize, message: impl Into<String>) -> Self {
		self.min_length = Some(Rule {
			value: length,
			message: message.into(),
		});
		self
	}

	pub fn max_length(mut self, length: usize, message: impl Into<String>) -> Self {
		self.max_length = Some(Rule {
			value: length,
			message: message.into(),
		});
		self
	}

	pub fn pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
		self.pattern = Some(Rule {
			value: pattern,
			message: message.into(),
		});
		self
	}

	/// Add a custom validator reported with the `validate` type
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::{ValidateResult, ValidationRules};
	///
	/// let rules = ValidationRules::new().validate(|value| async move {
	/// 	ValidateResult::from(value.as_str() != Some("admin"))
	/// });
	/// assert!(!rules.is_empty());
	/// ```
	pub fn validate<F, Fut>(self, validator: F) -> Self
	where
		F: Fn(Value) -> Fut + 'static,
		Fut: Future<Output = ValidateResult> + 'static,
	{
		self.validate_named(ErrorType::Validate, validator)
	}

	/// Add a custom validator whose failures are reported under `key`
	pub fn validate_named<F, Fut>(mut self, key: impl Into<ErrorType>, validator: F) -> Self
	where
		F: Fn(Value) -> Fut + 'static,
		Fut: Future<Output = ValidateResult> + 'static,
	{
		let validator: ValidatorFn =
			Rc::new(move |value| -> LocalBoxFuture<'static, ValidateResult> {
				Box::pin(validator(value))
			});
		self.validate.push((key.into(), validator));
		self
	}
}

impl fmt::Debug for ValidationRules {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValidationRules")
			.field("required", &self.required)
			.field("min", &self.min)
			.field("max", &self.max)
			.field("min_length", &self.min_length)
			.field("max_length", &self.max_length)
			.field("pattern", &self.pattern)
			.field(
				"validate",
				&self.validate.iter().map(|(key, _)| key).collect::<Vec<_>>(),
			)
			.finish()
	}
}

/// Whether `value` counts as missing for the `required` rule
pub fn is_empty_value(value: &Value) -> bool {
	match value {
		Value::Null | Value::Bool(false) => true,
		Value::String(text) => text.is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

struct Collector {
	criteria: CriteriaMode,
	error: Option<FieldError>,
}

impl Collector {
	/// Record a failure; returns `true` when evaluation should stop.
	fn fail(&mut self, error_type: ErrorType, message: &str) -> bool {
		let mut error = FieldError::new(error_type.clone(), message);
		if self.criteria == CriteriaMode::All {
			error.types = self
				.error
				.take()
				.map(|previous| previous.types)
				.unwrap_or_default();
			error.types.insert(error_type.to_string(), message.to_string());
		}
		self.error = Some(error);
		self.criteria == CriteriaMode::FirstError
	}
}

/// Evaluate `rules` against `value`
///
/// Returns `None` when every rule passes.
///
/// # Examples
///
/// ```
/// use reinhardt_form_control::{CriteriaMode, ErrorType, ValidationRules};
/// use reinhardt_form_control::rules::validate_value;
/// use serde_json::json;
///
/// let rules = ValidationRules::new().required("Required");
/// let error = futures::executor::block_on(
/// 	validate_value(&json!(""), &rules, CriteriaMode::FirstError),
/// );
/// assert_eq!(error.map(|e| e.error_type), Some(ErrorType::Required));
/// ```
pub async fn validate_value(
	value: &Value,
	rules: &ValidationRules,
	criteria: CriteriaMode,
) -> Option<FieldError> {
	let mut collector = Collector {
		criteria,
		error: None,
	};
	let empty = is_empty_value(value);

	if let Some(message) = &rules.required {
		if empty && collector.fail(ErrorType::Required, message) {
			return collector.error;
		}
	}

	if !matches!(value, Value::Null) && value.as_str() != Some("") {
		if let Some(rule) = &rules.min {
			if compare(value, rule.value) == Some(Ordering::Less)
				&& collector.fail(ErrorType::Min, &rule.message)
			{
				return collector.error;
			}
		}
		if let Some(rule) = &rules.max {
			if compare(value, rule.value) == Some(Ordering::Greater)
				&& collector.fail(ErrorType::Max, &rule.message)
			{
				return collector.error;
			}
		}
	}

	if let Some(text) = value.as_str().filter(|text| !text.is_empty()) {
		let length = text.chars().count();
		if let Some(rule) = &rules.max_length {
			if length > rule.value && collector.fail(ErrorType::MaxLength, &rule.message) {
				return collector.error;
			}
		}
		if let Some(rule) = &rules.min_length {
			if length < rule.value && collector.fail(ErrorType::MinLength, &rule.message) {
				return collector.error;
			}
		}
		if let Some(rule) = &rules.pattern {
			if !rule.value.is_match(text) && collector.fail(ErrorType::Pattern, &rule.message) {
				return collector.error;
			}
		}
	}

	for (key, validator) in &rules.validate {
		let message = match validator(value.clone()).await {
			ValidateResult::Valid => continue,
			ValidateResult::Invalid => String::new(),
			ValidateResult::Message(message) => message,
		};
		if collector.fail(key.clone(), &message) {
			return collector.error;
		}
	}

	collector.error
}

fn compare(value: &Value, bound: Bound) -> Option<Ordering> {
	match bound {
		Bound::Number(bound) => as_number(value).and_then(|number| number.partial_cmp(&bound)),
		Bound::Date(bound) => value
			.as_str()
			.and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
			.map(|date| date.cmp(&bound)),
	}
}

fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn check(value: Value, rules: &ValidationRules) -> Option<FieldError> {
		futures::executor::block_on(validate_value(&value, rules, CriteriaMode::FirstError))
	}

	#[rstest]
	#[case(json!(null), true)]
	#[case(json!(""), true)]
	#[case(json!(false), true)]
	#[case(json!([]), true)]
	#[case(json!(0), false)]
	#[case(json!("x"), false)]
	#[case(json!(true), false)]
	#[case(json!(["a"]), false)]
	fn test_is_empty_value(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(is_empty_value(&value), expected);
	}

	#[rstest]
	fn test_required() {
		let rules = ValidationRules::new().required("Required");

		let error = check(json!(""), &rules).expect("empty value fails");
		assert_eq!(error.error_type, ErrorType::Required);
		assert_eq!(error.message, "Required");
		assert!(check(json!("filled"), &rules).is_none());
	}

	#[rstest]
	#[case(json!(5), Some(ErrorType::Min))]
	#[case(json!("5"), Some(ErrorType::Min))]
	#[case(json!(10), None)]
	#[case(json!(21), Some(ErrorType::Max))]
	#[case(json!("not a number"), None)]
	#[case(json!(""), None)]
	fn test_numeric_bounds(#[case] value: Value, #[case] expected: Option<ErrorType>) {
		let rules = ValidationRules::new()
			.min(Bound::Number(10.0), "too small")
			.max(Bound::Number(20.0), "too big");

		assert_eq!(check(value, &rules).map(|error| error.error_type), expected);
	}

	#[rstest]
	fn test_date_bounds() {
		let bound = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
		let rules = ValidationRules::new().min(Bound::Date(bound), "too early");

		assert!(check(json!("2023-12-31"), &rules).is_some());
		assert!(check(json!("2024-01-01"), &rules).is_none());
	}

	#[rstest]
	fn test_length_counts_characters() {
		let rules = ValidationRules::new()
			.min_length(2, "short")
			.max_length(3, "long");

		assert_eq!(
			check(json!("é"), &rules).map(|error| error.error_type),
			Some(ErrorType::MinLength)
		);
		assert!(check(json!("éé"), &rules).is_none());
		assert_eq!(
			check(json!("éééé"), &rules).map(|error| error.error_type),
			Some(ErrorType::MaxLength)
		);
		assert!(check(json!(""), &rules).is_none());
	}

	#[rstest]
	fn test_pattern_skips_empty_strings() {
		let rules = ValidationRules::new().pattern(
			Regex::new(r"^\d+$").expect("valid regex"),
			"digits only",
		);

		assert!(check(json!(""), &rules).is_none());
		assert!(check(json!("123"), &rules).is_none());
		assert_eq!(
			check(json!("12a"), &rules).map(|error| error.message),
			Some("digits only".to_string())
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_custom_validators_use_their_key() {
		let rules = ValidationRules::new()
			.validate(|_| async { ValidateResult::Valid })
			.validate_named("unique", |value| async move {
				if value == json!("taken") {
					ValidateResult::from("Already taken")
				} else {
					ValidateResult::Valid
				}
			});

		let error = validate_value(&json!("taken"), &rules, CriteriaMode::FirstError)
			.await
			.expect("validator fails");

		assert_eq!(error.error_type, ErrorType::Custom("unique".to_string()));
		assert_eq!(error.message, "Already taken");
	}

	#[rstest]
	#[tokio::test]
	async fn test_criteria_all_collects_types() {
		let rules = ValidationRules::new()
			.min_length(5, "short")
			.pattern(Regex::new("^[a-z]+$").expect("valid regex"), "lowercase")
			.validate(|_| async { ValidateResult::from(false) });

		let error = validate_value(&json!("AB"), &rules, CriteriaMode::All)
			.await
			.expect("rules fail");

		assert_eq!(error.error_type, ErrorType::Validate);
		assert_eq!(error.message, "");
		assert_eq!(error.types.len(), 3);
		assert_eq!(error.types.get("minLength").map(String::as_str), Some("short"));
		assert_eq!(error.types.get("pattern").map(String::as_str), Some("lowercase"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_first_error_stops_early() {
		let called = Rc::new(std::cell::Cell::new(false));
		let flag = called.clone();
		let rules = ValidationRules::new()
			.required("Required")
			.validate(move |_| {
				flag.set(true);
				async { ValidateResult::Valid }
			});

		let error = validate_value(&Value::Null, &rules, CriteriaMode::FirstError).await;

		assert_eq!(error.map(|e| e.error_type), Some(ErrorType::Required));
		assert!(!called.get());
	}
}
