//! Collaborator interfaces
//!
//! The engine never touches a concrete UI toolkit. Inputs are reached through
//! [`InputHandle`], detachment from the host tree through
//! [`RemovalObserver`], and focus through [`FocusManager`]. The
//! [`memory`](crate::memory) module provides in-memory implementations.

use futures::future::LocalBoxFuture;
use serde_json::Value;
use std::rc::Rc;

/// Kind of input behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
	Text,
	Checkbox,
	Radio,
	SelectOne,
	SelectMultiple,
	File,
	/// A value holder without a host element. It gets no change listener and
	/// no removal observer.
	Custom,
}

impl InputKind {
	pub fn is_radio_or_checkbox(self) -> bool {
		matches!(self, InputKind::Radio | InputKind::Checkbox)
	}

	pub fn is_select(self) -> bool {
		matches!(self, InputKind::SelectOne | InputKind::SelectMultiple)
	}
}

/// Event types delivered to the shared change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
	Change,
	Blur,
}

/// An input event forwarded by a handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEvent {
	pub kind: EventKind,
	pub name: String,
}

impl FieldEvent {
	pub fn change(name: impl Into<String>) -> Self {
		Self {
			kind: EventKind::Change,
			name: name.into(),
		}
	}

	pub fn blur(name: impl Into<String>) -> Self {
		Self {
			kind: EventKind::Blur,
			name: name.into(),
		}
	}
}

/// The listener a handle calls for change and blur events
///
/// The returned future performs dirty tracking and validation; the host is
/// expected to drive it on its local executor.
pub type ChangeCallback = Rc<dyn Fn(FieldEvent) -> LocalBoxFuture<'static, ()>>;

/// A bound input element
///
/// Only `name`, `kind`, the value accessors and listener attachment are
/// required. Kind-specific accessors default to inert implementations so a
/// text-like handle does not have to implement checkbox or file support.
pub trait InputHandle {
	fn name(&self) -> String;

	fn kind(&self) -> InputKind;

	/// The raw value attribute. For radio and checkbox handles this is the
	/// option value reported when the option is checked.
	fn value(&self) -> Value;

	fn set_value(&self, value: Value);

	fn is_checked(&self) -> bool {
		false
	}

	fn set_checked(&self, _checked: bool) {}

	fn selected_values(&self) -> Vec<Value> {
		Vec::new()
	}

	fn set_selected_values(&self, _values: &[Value]) {}

	/// The live file list, never coerced into a primitive.
	fn files(&self) -> Value {
		Value::Null
	}

	fn set_files(&self, _files: Value) {}

	/// Attach the single change listener, replacing any previous one.
	fn attach(&self, listener: ChangeCallback);

	fn detach(&self);

	fn focus(&self) {}
}

pub type HandleRef = Rc<dyn InputHandle>;

/// Handle identity, ignoring vtable differences between coercion sites.
pub fn same_handle(a: &HandleRef, b: &HandleRef) -> bool {
	std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Called once when an observed handle leaves its host tree.
pub type RemovalCallback = Box<dyn FnOnce() -> LocalBoxFuture<'static, ()>>;

/// Detects detachment of handles from their host tree
pub trait RemovalObserver {
	/// Start observing `handle`. The returned watch stops the observation
	/// when dropped.
	fn observe(&self, handle: &HandleRef, on_removed: RemovalCallback) -> RemovalWatch;
}

/// Guard for one removal observation
pub struct RemovalWatch {
	disconnect: Option<Box<dyn FnOnce()>>,
}

impl RemovalWatch {
	pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
		Self {
			disconnect: Some(Box::new(disconnect)),
		}
	}

	/// A watch that observes nothing.
	pub fn inert() -> Self {
		Self { disconnect: None }
	}
}

impl Drop for RemovalWatch {
	fn drop(&mut self) {
		if let Some(disconnect) = self.disconnect.take() {
			disconnect();
		}
	}
}

/// Moves input focus to a handle
pub trait FocusManager {
	fn focus(&self, handle: &HandleRef);
}

/// Focus by calling [`InputHandle::focus`] directly
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleFocus;

impl FocusManager for HandleFocus {
	fn focus(&self, handle: &HandleRef) {
		handle.focus();
	}
}
