//! Reactive form state for Reinhardt
//!
//! This crate tracks the live state of a multi-field form:
//! - Registration of input handles with per-field validation rules
//! - Reading and writing values across text, checkbox, radio, select and file inputs
//! - Incremental dirty, touched and validity tracking
//! - Rule-based or resolver-based validation with error reconciliation
//! - Watch subscriptions that notify only the consumers interested in a change
//! - Read-tracked state subscriptions, submission and reset
//!
//! Rendering, DOM binding and focus mechanics stay with the host; they are
//! reached through the [`InputHandle`], [`RemovalObserver`] and
//! [`FocusManager`] traits. [`memory`] provides in-memory implementations.

mod accessor;
pub mod config;
pub mod error;
pub mod form;
pub mod handle;
pub mod memory;
mod registry;
pub mod resolver;
pub mod rules;
pub mod state;
pub mod target;
mod watch;

pub use config::{CriteriaMode, FormBuilder, FormOptions, ModeFlags, ValidationMode};
pub use error::{ErrorOption, ErrorType, FieldError, FieldErrors, FormError, FormResult};
pub use form::{FormController, KeepStateOptions, SetValueOptions, SubmitOutcome, WatchSubscription};
pub use handle::{
	ChangeCallback, EventKind, FieldEvent, FocusManager, HandleFocus, HandleRef, InputHandle,
	InputKind, RemovalCallback, RemovalObserver, RemovalWatch, same_handle,
};
pub use resolver::{Resolver, ResolverResult};
pub use rules::{Bound, Rule, ValidateResult, ValidationRules, ValidatorFn};
pub use state::{FormState, FormStatePatch, FormStateSubscription, StateSlices};
pub use target::FieldTarget;
