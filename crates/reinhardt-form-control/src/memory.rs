//! In-memory collaborators
//!
//! [`MemoryInput`] is an [`InputHandle`] that keeps its state in cells, and
//! [`ManualRemovalObserver`] is a [`RemovalObserver`] whose removals are
//! triggered explicitly. Both serve hosts without a DOM and tests.
//!
//! ## Example
//!
//! ```
//! use reinhardt_form_control::memory::MemoryInput;
//! use reinhardt_form_control::InputHandle;
//! use serde_json::json;
//!
//! let email = MemoryInput::text("email");
//! email.set_value(json!("a@example.com"));
//! assert_eq!(email.value(), json!("a@example.com"));
//! ```

use crate::handle::{
	ChangeCallback, EventKind, FieldEvent, HandleRef, InputHandle, InputKind, RemovalCallback,
	RemovalObserver, RemovalWatch, same_handle,
};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// An input whose state lives in memory
pub struct MemoryInput {
	name: String,
	kind: InputKind,
	value: RefCell<Value>,
	checked: Cell<bool>,
	options: Vec<Value>,
	selected: RefCell<Vec<Value>>,
	files: RefCell<Value>,
	listener: RefCell<Option<ChangeCallback>>,
	focus_count: Cell<usize>,
}

impl MemoryInput {
	fn build(name: &str, kind: InputKind, value: Value, options: Vec<Value>) -> Rc<Self> {
		Rc::new(Self {
			name: name.to_string(),
			kind,
			value: RefCell::new(value),
			checked: Cell::new(false),
			options,
			selected: RefCell::new(Vec::new()),
			files: RefCell::new(Value::Null),
			listener: RefCell::new(None),
			focus_count: Cell::new(0),
		})
	}

	pub fn text(name: &str) -> Rc<Self> {
		Self::build(name, InputKind::Text, Value::String(String::new()), Vec::new())
	}

	/// A text input with an initial value
	pub fn text_with(name: &str, value: impl Into<Value>) -> Rc<Self> {
		Self::build(name, InputKind::Text, value.into(), Vec::new())
	}

	/// One checkbox; several checkboxes sharing `name` form a group
	pub fn checkbox(name: &str, value: impl Into<Value>) -> Rc<Self> {
		Self::build(name, InputKind::Checkbox, value.into(), Vec::new())
	}

	pub fn radio(name: &str, value: impl Into<Value>) -> Rc<Self> {
		Self::build(name, InputKind::Radio, value.into(), Vec::new())
	}

	pub fn select(name: &str, options: Vec<Value>) -> Rc<Self> {
		Self::build(
			name,
			InputKind::SelectOne,
			Value::String(String::new()),
			options,
		)
	}

	pub fn select_multiple(name: &str, options: Vec<Value>) -> Rc<Self> {
		Self::build(name, InputKind::SelectMultiple, Value::Null, options)
	}

	pub fn file(name: &str) -> Rc<Self> {
		Self::build(name, InputKind::File, Value::Null, Vec::new())
	}

	pub fn custom(name: &str) -> Rc<Self> {
		Self::build(name, InputKind::Custom, Value::Null, Vec::new())
	}

	pub fn handle(self: &Rc<Self>) -> HandleRef {
		self.clone()
	}

	/// Set the value as a user would and dispatch a change event.
	pub fn input(&self, value: impl Into<Value>) -> LocalBoxFuture<'static, ()> {
		self.set_value(value.into());
		self.dispatch(EventKind::Change)
	}

	/// Toggle the checked state and dispatch a change event.
	pub fn click(&self, checked: bool) -> LocalBoxFuture<'static, ()> {
		self.set_checked(checked);
		self.dispatch(EventKind::Change)
	}

	pub fn choose(&self, values: Vec<Value>) -> LocalBoxFuture<'static, ()> {
		self.set_selected_values(&values);
		self.dispatch(EventKind::Change)
	}

	pub fn blur(&self) -> LocalBoxFuture<'static, ()> {
		self.dispatch(EventKind::Blur)
	}

	pub fn is_attached(&self) -> bool {
		self.listener.borrow().is_some()
	}

	pub fn focus_count(&self) -> usize {
		self.focus_count.get()
	}

	fn dispatch(&self, kind: EventKind) -> LocalBoxFuture<'static, ()> {
		let listener = self.listener.borrow().clone();
		match listener {
			Some(listener) => listener(FieldEvent {
				kind,
				name: self.name.clone(),
			}),
			None => futures::future::ready(()).boxed_local(),
		}
	}
}

impl InputHandle for MemoryInput {
	fn name(&self) -> String {
		self.name.clone()
	}

	fn kind(&self) -> InputKind {
		self.kind
	}

	fn value(&self) -> Value {
		self.value.borrow().clone()
	}

	fn set_value(&self, value: Value) {
		*self.value.borrow_mut() = value;
	}

	fn is_checked(&self) -> bool {
		self.checked.get()
	}

	fn set_checked(&self, checked: bool) {
		self.checked.set(checked);
	}

	fn selected_values(&self) -> Vec<Value> {
		self.selected.borrow().clone()
	}

	fn set_selected_values(&self, values: &[Value]) {
		*self.selected.borrow_mut() = self
			.options
			.iter()
			.filter(|option| values.contains(option))
			.cloned()
			.collect();
	}

	fn files(&self) -> Value {
		self.files.borrow().clone()
	}

	fn set_files(&self, files: Value) {
		*self.files.borrow_mut() = files;
	}

	fn attach(&self, listener: ChangeCallback) {
		*self.listener.borrow_mut() = Some(listener);
	}

	fn detach(&self) {
		self.listener.borrow_mut().take();
	}

	fn focus(&self) {
		self.focus_count.set(self.focus_count.get() + 1);
	}
}

struct Observation {
	id: u64,
	handle: HandleRef,
	on_removed: RemovalCallback,
}

#[derive(Default)]
struct ObserverState {
	next_id: u64,
	observations: Vec<Observation>,
}

/// A removal observer driven by explicit [`remove`](Self::remove) calls
#[derive(Default)]
pub struct ManualRemovalObserver {
	state: Rc<RefCell<ObserverState>>,
}

impl ManualRemovalObserver {
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	/// Report `handle` as removed from the host tree.
	///
	/// Every observation of the handle fires once and is then forgotten.
	pub async fn remove(&self, handle: &HandleRef) {
		let fired: Vec<RemovalCallback> = {
			let mut state = self.state.borrow_mut();
			let (matching, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut state.observations)
				.into_iter()
				.partition(|observation| same_handle(&observation.handle, handle));
			state.observations = remaining;
			matching
				.into_iter()
				.map(|observation| observation.on_removed)
				.collect()
		};

		for on_removed in fired {
			on_removed().await;
		}
	}

	pub fn observed_count(&self) -> usize {
		self.state.borrow().observations.len()
	}
}

impl RemovalObserver for ManualRemovalObserver {
	fn observe(&self, handle: &HandleRef, on_removed: RemovalCallback) -> RemovalWatch {
		let id = {
			let mut state = self.state.borrow_mut();
			state.next_id += 1;
			let id = state.next_id;
			state.observations.push(Observation {
				id,
				handle: handle.clone(),
				on_removed,
			});
			id
		};

		let state: Weak<RefCell<ObserverState>> = Rc::downgrade(&self.state);
		RemovalWatch::new(move || {
			let Some(state) = state.upgrade() else {
				return;
			};
			if let Ok(mut state) = state.try_borrow_mut() {
				state.observations.retain(|observation| observation.id != id);
			}
		})
	}
}
