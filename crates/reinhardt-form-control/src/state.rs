//! Observed form state and read-tracked subscriptions
//!
//! [`FormState`] is the state consumers render from. The engine changes it
//! only through [`FormStatePatch`]es applied at one place; each application
//! notifies exactly the consumers that have read one of the patched slices.
//!
//! A consumer's interest is recorded by [`FormStateSubscription`]: every
//! getter marks its slice as read. The set only grows.
//!
//! ```text
//!   patch ──► apply ──► changed slices ∩ consumer reads ≠ ∅ ──► notify
//! ```

use crate::error::FieldErrors;
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// The observed state of a form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
	pub is_dirty: bool,
	/// Nested tree with a `true` leaf for every dirty field
	pub dirty_fields: Value,
	/// Nested tree with a `true` leaf for every blurred field
	pub touched: Value,
	pub is_submitted: bool,
	pub submit_count: u32,
	pub is_submitting: bool,
	pub is_valid: bool,
	pub errors: FieldErrors,
}

impl FormState {
	pub fn new(is_valid: bool) -> Self {
		Self {
			is_dirty: false,
			dirty_fields: empty_tree(),
			touched: empty_tree(),
			is_submitted: false,
			submit_count: 0,
			is_submitting: false,
			is_valid,
			errors: FieldErrors::new(),
		}
	}

	pub fn is_field_dirty(&self, name: &str) -> bool {
		reinhardt_form_path::get(&self.dirty_fields, name).is_some()
	}

	pub fn is_field_touched(&self, name: &str) -> bool {
		reinhardt_form_path::get(&self.touched, name).is_some()
	}
}

pub(crate) fn empty_tree() -> Value {
	Value::Object(Default::default())
}

/// A partial update of [`FormState`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormStatePatch {
	pub is_dirty: Option<bool>,
	pub dirty_fields: Option<Value>,
	pub touched: Option<Value>,
	pub is_submitted: Option<bool>,
	pub submit_count: Option<u32>,
	pub is_submitting: Option<bool>,
	pub is_valid: Option<bool>,
	pub errors: Option<FieldErrors>,
}

impl FormStatePatch {
	pub fn is_empty(&self) -> bool {
		self.slices() == StateSlices::default()
	}

	/// The slices this patch writes
	pub fn slices(&self) -> StateSlices {
		StateSlices {
			is_dirty: self.is_dirty.is_some(),
			dirty_fields: self.dirty_fields.is_some(),
			touched: self.touched.is_some(),
			is_submitted: self.is_submitted.is_some(),
			submit_count: self.submit_count.is_some(),
			is_submitting: self.is_submitting.is_some(),
			is_valid: self.is_valid.is_some(),
			errors: self.errors.is_some(),
		}
	}

	/// Combine with a later patch; values from `later` win.
	pub fn merge(mut self, later: FormStatePatch) -> Self {
		macro_rules! take_later {
			($($field:ident),*) => {
				$(if later.$field.is_some() {
					self.$field = later.$field;
				})*
			};
		}
		take_later!(
			is_dirty,
			dirty_fields,
			touched,
			is_submitted,
			submit_count,
			is_submitting,
			is_valid,
			errors
		);
		self
	}

	fn apply_to(self, state: &mut FormState) {
		macro_rules! assign_some {
			($($field:ident),*) => {
				$(if let Some(value) = self.$field {
					state.$field = value;
				})*
			};
		}
		assign_some!(
			is_dirty,
			dirty_fields,
			touched,
			is_submitted,
			submit_count,
			is_submitting,
			is_valid,
			errors
		);
	}
}

/// One flag per top-level [`FormState`] key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSlices {
	pub is_dirty: bool,
	pub dirty_fields: bool,
	pub touched: bool,
	pub is_submitted: bool,
	pub submit_count: bool,
	pub is_submitting: bool,
	pub is_valid: bool,
	pub errors: bool,
}

impl StateSlices {
	pub fn intersects(&self, other: &StateSlices) -> bool {
		(self.is_dirty && other.is_dirty)
			|| (self.dirty_fields && other.dirty_fields)
			|| (self.touched && other.touched)
			|| (self.is_submitted && other.is_submitted)
			|| (self.submit_count && other.submit_count)
			|| (self.is_submitting && other.is_submitting)
			|| (self.is_valid && other.is_valid)
			|| (self.errors && other.errors)
	}

	pub fn union(self, other: StateSlices) -> StateSlices {
		StateSlices {
			is_dirty: self.is_dirty || other.is_dirty,
			dirty_fields: self.dirty_fields || other.dirty_fields,
			touched: self.touched || other.touched,
			is_submitted: self.is_submitted || other.is_submitted,
			submit_count: self.submit_count || other.submit_count,
			is_submitting: self.is_submitting || other.is_submitting,
			is_valid: self.is_valid || other.is_valid,
			errors: self.errors || other.errors,
		}
	}
}

/// Re-render callbacks collected while engine state is borrowed
///
/// They are fired once every borrow is released, since a consumer may call
/// back into the form from its callback.
#[derive(Default)]
#[must_use = "notifications do nothing until fired"]
pub(crate) struct Notifications(Vec<Rc<dyn Fn()>>);

impl Notifications {
	pub(crate) fn push(&mut self, notify: Rc<dyn Fn()>) {
		self.0.push(notify);
	}

	pub(crate) fn fire(self) {
		for notify in self.0 {
			notify();
		}
	}
}

struct Consumer {
	id: u64,
	reads: Rc<Cell<StateSlices>>,
	notify: Rc<dyn Fn()>,
}

struct StoreInner {
	state: FormState,
	consumers: Vec<Consumer>,
	next_id: u64,
	unmounted: bool,
	warn_on_valid_read: bool,
}

/// Owner of the observed [`FormState`] and its consumers
pub(crate) struct FormStateStore {
	inner: Rc<RefCell<StoreInner>>,
}

impl FormStateStore {
	pub(crate) fn new(initial: FormState, warn_on_valid_read: bool) -> Self {
		Self {
			inner: Rc::new(RefCell::new(StoreInner {
				state: initial,
				consumers: Vec::new(),
				next_id: 0,
				unmounted: false,
				warn_on_valid_read,
			})),
		}
	}

	pub(crate) fn snapshot(&self) -> FormState {
		self.inner.borrow().state.clone()
	}

	pub(crate) fn read<R>(&self, f: impl FnOnce(&FormState) -> R) -> R {
		f(&self.inner.borrow().state)
	}

	/// Merge `patch` into the state and collect the consumers to notify.
	///
	/// After unmount the patch is dropped.
	pub(crate) fn apply(&self, patch: FormStatePatch) -> Notifications {
		let mut inner = self.inner.borrow_mut();
		let mut notifications = Notifications::default();
		if inner.unmounted || patch.is_empty() {
			return notifications;
		}

		let changed = patch.slices();
		patch.apply_to(&mut inner.state);
		for consumer in &inner.consumers {
			if consumer.reads.get().intersects(&changed) {
				notifications.push(consumer.notify.clone());
			}
		}
		notifications
	}

	pub(crate) fn publish(&self, patch: FormStatePatch) {
		self.apply(patch).fire();
	}

	/// Every consumer, regardless of what it has read
	pub(crate) fn rerender_all(&self) -> Notifications {
		let inner = self.inner.borrow();
		let mut notifications = Notifications::default();
		if !inner.unmounted {
			for consumer in &inner.consumers {
				notifications.push(consumer.notify.clone());
			}
		}
		notifications
	}

	pub(crate) fn subscribe(&self, notify: Rc<dyn Fn()>) -> FormStateSubscription {
		let mut inner = self.inner.borrow_mut();
		inner.next_id += 1;
		let id = inner.next_id;
		let reads = Rc::new(Cell::new(StateSlices::default()));
		inner.consumers.push(Consumer {
			id,
			reads: reads.clone(),
			notify,
		});

		FormStateSubscription {
			id,
			reads,
			store: Rc::downgrade(&self.inner),
			warn_on_valid_read: inner.warn_on_valid_read,
		}
	}

	pub(crate) fn unmount(&self) {
		let mut inner = self.inner.borrow_mut();
		inner.unmounted = true;
		inner.consumers.clear();
	}
}

/// A consumer's read-tracked view of the form state
///
/// Dropping the subscription stops its notifications.
pub struct FormStateSubscription {
	id: u64,
	reads: Rc<Cell<StateSlices>>,
	store: Weak<RefCell<StoreInner>>,
	warn_on_valid_read: bool,
}

impl FormStateSubscription {
	fn read<R: Default>(
		&self,
		mark: impl FnOnce(&mut StateSlices),
		get: impl FnOnce(&FormState) -> R,
	) -> R {
		let mut reads = self.reads.get();
		mark(&mut reads);
		self.reads.set(reads);

		match self.store.upgrade() {
			Some(store) => get(&store.borrow().state),
			None => R::default(),
		}
	}

	pub fn is_dirty(&self) -> bool {
		self.read(|r| r.is_dirty = true, |s| s.is_dirty)
	}

	pub fn dirty_fields(&self) -> Value {
		self.read(|r| r.dirty_fields = true, |s| s.dirty_fields.clone())
	}

	pub fn touched(&self) -> Value {
		self.read(|r| r.touched = true, |s| s.touched.clone())
	}

	pub fn is_submitted(&self) -> bool {
		self.read(|r| r.is_submitted = true, |s| s.is_submitted)
	}

	pub fn submit_count(&self) -> u32 {
		self.read(|r| r.submit_count = true, |s| s.submit_count)
	}

	pub fn is_submitting(&self) -> bool {
		self.read(|r| r.is_submitting = true, |s| s.is_submitting)
	}

	/// Only meaningful when validation is not submit-gated.
	pub fn is_valid(&self) -> bool {
		if self.warn_on_valid_read && !self.reads.get().is_valid {
			tracing::warn!(
				"`is_valid` is only maintained with the onChange, onBlur, onTouched or all modes"
			);
		}
		self.read(|r| r.is_valid = true, |s| s.is_valid)
	}

	pub fn errors(&self) -> FieldErrors {
		self.read(|r| r.errors = true, |s| s.errors.clone())
	}

	/// The slices read so far
	pub fn reads(&self) -> StateSlices {
		self.reads.get()
	}

	/// The full state without recording any read
	pub fn snapshot(&self) -> Option<FormState> {
		self.store
			.upgrade()
			.map(|store| store.borrow().state.clone())
	}
}

impl Drop for FormStateSubscription {
	fn drop(&mut self) {
		let Some(store) = self.store.upgrade() else {
			return;
		};
		if let Ok(mut inner) = store.try_borrow_mut() {
			inner.consumers.retain(|consumer| consumer.id != self.id);
		}
	}
}
