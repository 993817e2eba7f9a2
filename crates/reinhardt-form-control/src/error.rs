//! Errors produced by the form engine
//!
//! Two kinds of failure are kept apart:
//!
//! - [`FormError`] reports misuse of the engine API (a handle without a name,
//!   a call after [`dispose`](crate::FormController::dispose)). Registration
//!   errors are also logged through `tracing` and the registration is ignored.
//! - [`FieldError`] is a validation outcome stored in the observed form state.
//!   Validation never fails with a `FormError`.

use crate::handle::HandleRef;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Engine usage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
	#[error("Field is missing a `name`")]
	MissingName,
	#[error("Field array member `{0}` should be named in object shape, e.g. `items[0].name`")]
	MalformedFieldArrayName(String),
	#[error("Form controller has been disposed")]
	Disposed,
}

pub type FormResult<T> = Result<T, FormError>;

/// Kind of a field validation error
///
/// Serialized as the plain strings `required`, `min`, `max`, `minLength`,
/// `maxLength`, `pattern` and `validate`. Named custom validators and
/// programmatic errors use [`ErrorType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorType {
	Required,
	Min,
	Max,
	MinLength,
	MaxLength,
	Pattern,
	Validate,
	Custom(String),
}

impl ErrorType {
	pub fn as_str(&self) -> &str {
		match self {
			ErrorType::Required => "required",
			ErrorType::Min => "min",
			ErrorType::Max => "max",
			ErrorType::MinLength => "minLength",
			ErrorType::MaxLength => "maxLength",
			ErrorType::Pattern => "pattern",
			ErrorType::Validate => "validate",
			ErrorType::Custom(name) => name,
		}
	}
}

impl fmt::Display for ErrorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for ErrorType {
	fn from(value: &str) -> Self {
		match value {
			"required" => ErrorType::Required,
			"min" => ErrorType::Min,
			"max" => ErrorType::Max,
			"minLength" => ErrorType::MinLength,
			"maxLength" => ErrorType::MaxLength,
			"pattern" => ErrorType::Pattern,
			"validate" => ErrorType::Validate,
			other => ErrorType::Custom(other.to_string()),
		}
	}
}

impl From<String> for ErrorType {
	fn from(value: String) -> Self {
		ErrorType::from(value.as_str())
	}
}

impl From<ErrorType> for String {
	fn from(value: ErrorType) -> Self {
		value.as_str().to_string()
	}
}

/// A validation error attached to one field path
///
/// `types` is only populated when the form runs with
/// [`CriteriaMode::All`](crate::CriteriaMode::All); it then maps every
/// failing rule to its message. `field_ref` points at the handle the error
/// belongs to and is never serialized.
#[derive(Clone, Serialize, Deserialize)]
pub struct FieldError {
	#[serde(rename = "type")]
	pub error_type: ErrorType,
	#[serde(default)]
	pub message: String,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub types: BTreeMap<String, String>,
	#[serde(skip)]
	pub field_ref: Option<HandleRef>,
}

impl FieldError {
	/// Create an error of the given type
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::{ErrorType, FieldError};
	///
	/// let error = FieldError::new(ErrorType::Required, "This field is required");
	/// assert_eq!(error.error_type.as_str(), "required");
	/// ```
	pub fn new(error_type: impl Into<ErrorType>, message: impl Into<String>) -> Self {
		Self {
			error_type: error_type.into(),
			message: message.into(),
			types: BTreeMap::new(),
			field_ref: None,
		}
	}

	pub fn with_ref(mut self, handle: Option<HandleRef>) -> Self {
		self.field_ref = handle;
		self
	}

	/// Two errors are the same when their type and message match.
	///
	/// This is the comparison used to decide whether a new validation result
	/// changes what a consumer sees.
	pub fn is_same(&self, other: &FieldError) -> bool {
		self.error_type == other.error_type && self.message == other.message
	}
}

impl PartialEq for FieldError {
	fn eq(&self, other: &Self) -> bool {
		self.is_same(other) && self.types == other.types
	}
}

impl fmt::Debug for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldError")
			.field("error_type", &self.error_type)
			.field("message", &self.message)
			.field("types", &self.types)
			.field("field_ref", &self.field_ref.as_ref().map(|handle| handle.name()))
			.finish()
	}
}

/// Field errors keyed by full field path
///
/// Keys are complete paths such as `items[0].name`. [`FieldErrors::to_value`]
/// produces the nested shape consumers render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn get(&self, name: &str) -> Option<&FieldError> {
		self.0.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn insert(&mut self, name: impl Into<String>, error: FieldError) {
		self.0.insert(name.into(), error);
	}

	/// Remove the error for `name` and for every path nested below it.
	pub fn remove(&mut self, name: &str) {
		self.0.retain(|key, _| !is_same_or_nested(key, name));
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
		self.0.iter().map(|(name, error)| (name.as_str(), error))
	}

	/// Overwrite entries with the errors from `other`.
	pub fn merge(&mut self, other: FieldErrors) {
		self.0.extend(other.0);
	}

	/// Nested representation, e.g. `{"user": {"name": {"type": "required", ...}}}`
	pub fn to_value(&self) -> Value {
		reinhardt_form_path::nest(self.0.iter().map(|(name, error)| {
			(
				name.clone(),
				serde_json::to_value(error).unwrap_or(Value::Null),
			)
		}))
	}
}

impl Serialize for FieldErrors {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.to_value().serialize(serializer)
	}
}

impl FromIterator<(String, FieldError)> for FieldErrors {
	fn from_iter<I: IntoIterator<Item = (String, FieldError)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for FieldErrors {
	type Item = (String, FieldError);
	type IntoIter = std::collections::btree_map::IntoIter<String, FieldError>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

fn is_same_or_nested(key: &str, name: &str) -> bool {
	key.strip_prefix(name)
		.is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}

/// A programmatic error injected with
/// [`set_error`](crate::FormController::set_error)
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorOption {
	pub error_type: ErrorType,
	pub message: String,
	pub should_focus: bool,
}

impl ErrorOption {
	pub fn new(error_type: impl Into<ErrorType>) -> Self {
		Self {
			error_type: error_type.into(),
			message: String::new(),
			should_focus: false,
		}
	}

	pub fn message(mut self, message: impl Into<String>) -> Self {
		self.message = message.into();
		self
	}

	pub fn should_focus(mut self, should_focus: bool) -> Self {
		self.should_focus = should_focus;
		self
	}
}
