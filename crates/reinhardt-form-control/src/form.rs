//! The form controller
//!
//! [`FormController`] owns one form's registry, value snapshots, validation
//! bookkeeping, watchers and observed state. It is created once per form
//! (see [`FormBuilder`]) and released with [`FormController::dispose`].
//!
//! ## Architecture
//!
//! ```text
//! input event ──► handle_event ──► update_dirty ──┐
//!                      │                          │
//!                      ▼                          ▼
//!              rules / resolver ──► reconcile ──► FormStateStore ──► consumers
//!                                      │
//!                                      └──► watch subscribers
//! ```
//!
//! The engine is single-threaded. Validation is the only suspension point;
//! every write after an `await` re-reads the live state. A result for a
//! removed field, or for a value the field no longer holds, is discarded,
//! and dirty flags are recomputed against the current tree. State borrows
//! are never held across an `await` or while consumer callbacks run.
//!
//! ## Example
//!
//! ```
//! use reinhardt_form_control::memory::MemoryInput;
//! use reinhardt_form_control::{FieldTarget, FormBuilder, SetValueOptions, ValidationRules};
//! use serde_json::json;
//!
//! # futures::executor::block_on(async {
//! let form = FormBuilder::new().build();
//! let email = MemoryInput::text("email");
//! form.register(email.handle(), ValidationRules::new().required("Required"))
//! 	.await
//! 	.unwrap();
//!
//! form.set_value("email", json!("a@example.com"), SetValueOptions::default().should_dirty(true))
//! 	.await;
//! assert!(form.form_state().is_dirty);
//! assert_eq!(form.get_values(FieldTarget::All), json!({"email": "a@example.com"}));
//! # });
//! ```

mod dirty;
mod errors;
mod events;
mod field_array;
mod register;
mod reset;
mod submit;
mod validation;
mod values;
mod watch;

pub use reset::KeepStateOptions;
pub use submit::SubmitOutcome;
pub use values::SetValueOptions;
pub use watch::WatchSubscription;

use crate::accessor;
use crate::config::{CriteriaMode, FormBuilder, FormOptions, ModeFlags};
use crate::error::FieldErrors;
use crate::handle::{ChangeCallback, FieldEvent, FocusManager, HandleFocus, HandleRef, RemovalObserver};
use crate::registry::FieldRegistry;
use crate::resolver::Resolver;
use crate::rules::ValidationRules;
use crate::state::{FormState, FormStatePatch, FormStateStore, FormStateSubscription, empty_tree};
use crate::watch::WatchRegistry;
use futures::future::LocalBoxFuture;
use reinhardt_form_path::field_array_parent;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::{Rc, Weak};

/// Mutable engine state, borrowed only between suspension points
pub(crate) struct FormInner {
	pub(crate) fields: FieldRegistry,
	pub(crate) default_values: Value,
	/// Value of each field captured at first registration or reset
	pub(crate) defaults_at_render: HashMap<String, Value>,
	/// Values of removed fields when they are kept across unmount
	pub(crate) shadow: Value,
	pub(crate) fields_with_rules: HashSet<String>,
	pub(crate) valid_fields: HashSet<String>,
	pub(crate) field_array_names: BTreeSet<String>,
	pub(crate) field_array_defaults: BTreeMap<String, Value>,
	pub(crate) field_array_resets: BTreeMap<String, Rc<dyn Fn()>>,
	pub(crate) disposed: bool,
}

impl FormInner {
	fn new(default_values: Value) -> Self {
		Self {
			fields: FieldRegistry::default(),
			default_values,
			defaults_at_render: HashMap::new(),
			shadow: empty_tree(),
			fields_with_rules: HashSet::new(),
			valid_fields: HashSet::new(),
			field_array_names: BTreeSet::new(),
			field_array_defaults: BTreeMap::new(),
			field_array_resets: BTreeMap::new(),
			disposed: false,
		}
	}

	pub(crate) fn value_of(&self, name: &str) -> Value {
		accessor::field_value(&self.fields, &self.shadow, name)
	}

	pub(crate) fn values(&self) -> Value {
		accessor::collect_values(&self.fields, &self.shadow, None)
	}

	/// `items[0].name` is a field-array member when `items` is a registered
	/// field array.
	pub(crate) fn is_in_field_array(&self, name: &str) -> bool {
		field_array_parent(name).is_some_and(|parent| self.field_array_names.contains(parent))
	}

	/// Rule-mode validity: every rule-bound field validated and no errors.
	pub(crate) fn rule_validity(&self, errors: &FieldErrors) -> bool {
		self.valid_fields.len() >= self.fields_with_rules.len() && errors.is_empty()
	}
}

pub(crate) struct FormCore {
	pub(crate) options: FormOptions,
	pub(crate) mode: ModeFlags,
	pub(crate) re_validate: ModeFlags,
	pub(crate) resolver: Option<Rc<dyn Resolver>>,
	pub(crate) removal_observer: Option<Rc<dyn RemovalObserver>>,
	pub(crate) focus: Rc<dyn FocusManager>,
	pub(crate) store: FormStateStore,
	pub(crate) watches: WatchRegistry,
	pub(crate) inner: RefCell<FormInner>,
	/// The one change listener attached to every handle
	pub(crate) listener: ChangeCallback,
}

/// Handle to one form's engine
///
/// Cloning is cheap and every clone drives the same form.
#[derive(Clone)]
pub struct FormController {
	pub(crate) core: Rc<FormCore>,
}

impl FormController {
	/// Start configuring a new form
	pub fn builder() -> FormBuilder {
		FormBuilder::new()
	}

	pub(crate) fn from_builder(builder: FormBuilder) -> Self {
		let FormBuilder {
			options,
			resolver,
			removal_observer,
			focus_manager,
		} = builder;
		let mode = options.mode.flags();
		let re_validate = options.re_validate_mode.flags();
		let store = FormStateStore::new(FormState::new(!mode.is_on_submit), mode.is_on_submit);
		let inner = FormInner::new(options.default_values.clone());
		let focus: Rc<dyn FocusManager> = match focus_manager {
			Some(focus) => focus,
			None => Rc::new(HandleFocus),
		};

		let core = Rc::new_cyclic(|weak: &Weak<FormCore>| {
			let weak = weak.clone();
			let listener: ChangeCallback =
				Rc::new(move |event: FieldEvent| -> LocalBoxFuture<'static, ()> {
					let weak = weak.clone();
					Box::pin(async move {
						if let Some(core) = weak.upgrade() {
							FormController { core }.handle_event(event).await;
						}
					})
				});

			FormCore {
				options,
				mode,
				re_validate,
				resolver,
				removal_observer,
				focus,
				store,
				watches: WatchRegistry::default(),
				inner: RefCell::new(inner),
				listener,
			}
		});

		tracing::debug!(
			mode = ?core.options.mode,
			resolver = core.resolver.is_some(),
			"form controller created"
		);
		Self { core }
	}

	/// Options the form was built with
	pub fn options(&self) -> &FormOptions {
		&self.core.options
	}

	/// Snapshot of the observed state, without read tracking
	pub fn form_state(&self) -> FormState {
		self.core.store.snapshot()
	}

	/// Subscribe a consumer to state changes
	///
	/// `notify` runs only after a change to a slice the consumer has read
	/// through the returned subscription.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::FormBuilder;
	/// use std::cell::Cell;
	/// use std::rc::Rc;
	///
	/// let form = FormBuilder::new().build();
	/// let renders = Rc::new(Cell::new(0));
	/// let counter = renders.clone();
	/// let state = form.subscribe(move || counter.set(counter.get() + 1));
	///
	/// assert!(!state.is_dirty());
	/// ```
	pub fn subscribe(&self, notify: impl Fn() + 'static) -> FormStateSubscription {
		self.core.store.subscribe(Rc::new(notify))
	}

	/// Whether a field is registered under `name`
	pub fn is_registered(&self, name: &str) -> bool {
		self.core.inner.borrow().fields.contains(name)
	}

	/// Registered field names in registration order
	pub fn field_names(&self) -> Vec<String> {
		self.core.inner.borrow().fields.names()
	}

	/// Whether [`dispose`](Self::dispose) has run
	pub fn is_disposed(&self) -> bool {
		self.core.inner.borrow().disposed
	}

	/// Detach every listener and removal watch and silence the form
	///
	/// Later state changes no longer notify anyone and registration fails
	/// with [`FormError::Disposed`](crate::FormError::Disposed).
	pub fn dispose(&self) {
		let entries = {
			let mut inner = self.core.inner.borrow_mut();
			if inner.disposed {
				return;
			}
			inner.disposed = true;
			inner.field_array_resets.clear();
			inner.fields.drain()
		};

		for (_, entry) in &entries {
			for handle in entry.handles() {
				handle.detach();
			}
		}
		drop(entries);

		self.core.store.unmount();
		self.core.watches.clear();
		tracing::debug!("form controller disposed");
	}

	pub(crate) fn criteria(&self) -> CriteriaMode {
		self.core.options.criteria_mode
	}

	pub(crate) fn values(&self) -> Value {
		self.core.inner.borrow().values()
	}

	pub(crate) fn primary_handle(&self, name: &str) -> Option<HandleRef> {
		self.core
			.inner
			.borrow()
			.fields
			.get(name)
			.and_then(|entry| entry.primary_handle())
	}

	/// Rules, current value and error handle of a registered field
	pub(crate) fn rule_input(
		&self,
		name: &str,
	) -> Option<(ValidationRules, Value, Option<HandleRef>)> {
		let inner = self.core.inner.borrow();
		let entry = inner.fields.get(name)?;
		Some((
			entry.rules.clone(),
			accessor::read_entry(entry),
			entry.primary_handle(),
		))
	}

	/// Whether `name` is registered and still reads as `value`
	pub(crate) fn holds_value(&self, name: &str, value: &Value) -> bool {
		self.core
			.inner
			.borrow()
			.fields
			.get(name)
			.is_some_and(|entry| accessor::read_entry(entry) == *value)
	}

	/// Validity to publish alongside a bookkeeping change; `None` in resolver
	/// mode, where validity comes from the resolver.
	pub(crate) fn rule_validity(&self, inner: &FormInner, errors: &FieldErrors) -> Option<bool> {
		match self.core.resolver {
			Some(_) => None,
			None => Some(inner.rule_validity(errors)),
		}
	}

	/// Whether a field's rules count towards rule-mode validity.
	///
	/// Fields validated by the resolver on registration are not tracked.
	pub(crate) fn tracks_rules(&self, inner: &FormInner, name: &str, rules: &ValidationRules) -> bool {
		!rules.is_empty() && !self.validates_with_resolver(inner, name)
	}

	pub(crate) fn validates_with_resolver(&self, inner: &FormInner, name: &str) -> bool {
		self.core.resolver.is_some() && !inner.is_in_field_array(name) && !self.core.mode.is_on_submit
	}

	pub(crate) fn rerender(&self) {
		self.core.store.rerender_all().fire();
	}

	/// Apply `patch` and notify its readers, or every consumer with
	/// `render_all`.
	pub(crate) fn publish_or_rerender(&self, patch: Option<FormStatePatch>, render_all: bool) {
		let notifications = patch
			.map(|patch| self.core.store.apply(patch))
			.unwrap_or_default();
		if render_all {
			self.rerender();
		} else {
			notifications.fire();
		}
	}
}

impl Default for FormController {
	fn default() -> Self {
		FormBuilder::new().build()
	}
}
