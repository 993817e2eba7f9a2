//! Whole-form validation through an external resolver
//!
//! A resolver receives the complete value tree and returns the full error map
//! plus the values to submit. When a form has a resolver, per-field rules are
//! not evaluated.
//!
//! The resolver must not fail; a panicking resolver is a contract violation
//! and is not handled by the engine.
//!
//! ## Example
//!
//! ```
//! use reinhardt_form_control::{CriteriaMode, ErrorType, FieldError, FieldErrors, ResolverResult};
//! use serde_json::Value;
//!
//! let resolver = |values: Value, _context: Option<Value>, _criteria: CriteriaMode| async move {
//! 	let mut errors = FieldErrors::new();
//! 	if values["name"].as_str().unwrap_or_default().is_empty() {
//! 		errors.insert("name", FieldError::new(ErrorType::Required, "Name is required"));
//! 	}
//! 	ResolverResult { values, errors }
//! };
//! # let _ = reinhardt_form_control::FormBuilder::new().resolver(resolver);
//! ```

use crate::config::CriteriaMode;
use crate::error::FieldErrors;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

/// Output of a resolver call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverResult {
	/// Normalized values handed to the submit callback
	pub values: Value,
	pub errors: FieldErrors,
}

#[async_trait(?Send)]
pub trait Resolver {
	/// Validate the whole value tree
	///
	/// # Arguments
	///
	/// - `values`: current values of every field
	/// - `context`: the form's configured context, if any
	/// - `criteria`: whether every failing rule per field should be reported
	async fn resolve(
		&self,
		values: &Value,
		context: Option<&Value>,
		criteria: CriteriaMode,
	) -> ResolverResult;
}

#[async_trait(?Send)]
impl<F, Fut> Resolver for F
where
	F: Fn(Value, Option<Value>, CriteriaMode) -> Fut,
	Fut: Future<Output = ResolverResult> + 'static,
{
	async fn resolve(
		&self,
		values: &Value,
		context: Option<&Value>,
		criteria: CriteriaMode,
	) -> ResolverResult {
		(self)(values.clone(), context.cloned(), criteria).await
	}
}
