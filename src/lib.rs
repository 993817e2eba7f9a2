//! # Reinhardt Form State
//!
//! Reactive state for client-side forms.
//!
//! A [`FormController`](control::FormController) binds input handles by name,
//! validates them with per-field rules or a whole-form resolver, tracks dirty,
//! touched and submit state, and notifies only the consumers interested in a
//! change.
//!
//! ## Crates
//!
//! - [`control`] - the form engine
//! - [`path`] - dot/bracket path addressing over nested values
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_form_state::prelude::*;
//! use serde_json::json;
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let form = FormBuilder::new()
//! 	.mode(ValidationMode::OnChange)
//! 	.default_values(json!({"email": ""}))
//! 	.build();
//! let email = MemoryInput::text("email");
//! form.register(email.handle(), ValidationRules::new().required("Email is required"))
//! 	.await
//! 	.unwrap();
//!
//! email.input("ada@example.com").await;
//!
//! let state = form.form_state();
//! assert!(state.is_dirty);
//! assert!(state.is_valid);
//! assert_eq!(form.get_values(FieldTarget::All), json!({"email": "ada@example.com"}));
//! # });
//! ```

pub use reinhardt_form_control as control;
pub use reinhardt_form_path as path;

/// Commonly used types
pub mod prelude {
	pub use reinhardt_form_control::memory::{ManualRemovalObserver, MemoryInput};
	pub use reinhardt_form_control::{
		CriteriaMode, ErrorOption, ErrorType, FieldError, FieldErrors, FieldTarget, FormBuilder,
		FormController, FormError, FormOptions, FormResult, FormState, FormStateSubscription,
		InputHandle, InputKind, KeepStateOptions, Resolver, ResolverResult, SetValueOptions,
		SubmitOutcome, ValidateResult, ValidationMode, ValidationRules, WatchSubscription,
	};
}
