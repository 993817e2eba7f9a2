//! Field registry
//!
//! Maps each field name to exactly one [`FieldEntry`]. Radio buttons and
//! checkboxes sharing a name are grouped into the options of a single entry,
//! each option keeping its own removal watch. Iteration follows registration
//! order, which is the order used to pick the field focused after a failed
//! submit.

use crate::handle::{HandleRef, InputKind, RemovalWatch, same_handle};
use crate::rules::ValidationRules;
use indexmap::IndexMap;

/// A handle together with the removal watch observing it
pub(crate) struct BoundHandle {
	pub(crate) handle: HandleRef,
	_watch: Option<RemovalWatch>,
}

impl BoundHandle {
	pub(crate) fn new(handle: HandleRef, watch: Option<RemovalWatch>) -> Self {
		Self {
			handle,
			_watch: watch,
		}
	}
}

/// How a field is bound to its input(s)
pub(crate) enum FieldBinding {
	Text(BoundHandle),
	Select { bound: BoundHandle, multiple: bool },
	File(BoundHandle),
	Custom(BoundHandle),
	Radio(Vec<BoundHandle>),
	Checkbox(Vec<BoundHandle>),
}

impl FieldBinding {
	/// Binding for a handle that is not part of an option group
	pub(crate) fn single(kind: InputKind, bound: BoundHandle) -> Self {
		match kind {
			InputKind::SelectOne => FieldBinding::Select {
				bound,
				multiple: false,
			},
			InputKind::SelectMultiple => FieldBinding::Select {
				bound,
				multiple: true,
			},
			InputKind::File => FieldBinding::File(bound),
			InputKind::Custom => FieldBinding::Custom(bound),
			InputKind::Radio => FieldBinding::Radio(vec![bound]),
			InputKind::Checkbox => FieldBinding::Checkbox(vec![bound]),
			InputKind::Text => FieldBinding::Text(bound),
		}
	}

	pub(crate) fn options_mut(&mut self) -> Option<&mut Vec<BoundHandle>> {
		match self {
			FieldBinding::Radio(options) | FieldBinding::Checkbox(options) => Some(options),
			_ => None,
		}
	}
}

/// One registered field
pub(crate) struct FieldEntry {
	pub(crate) binding: FieldBinding,
	pub(crate) rules: ValidationRules,
}

impl FieldEntry {
	pub(crate) fn handles(&self) -> Vec<HandleRef> {
		match &self.binding {
			FieldBinding::Text(bound)
			| FieldBinding::Select { bound, .. }
			| FieldBinding::File(bound)
			| FieldBinding::Custom(bound) => vec![bound.handle.clone()],
			FieldBinding::Radio(options) | FieldBinding::Checkbox(options) => {
				options.iter().map(|option| option.handle.clone()).collect()
			}
		}
	}

	/// The handle errors refer to and focus moves to
	pub(crate) fn primary_handle(&self) -> Option<HandleRef> {
		self.handles().into_iter().next()
	}

	pub(crate) fn contains(&self, handle: &HandleRef) -> bool {
		self.handles()
			.iter()
			.any(|existing| same_handle(existing, handle))
	}
}

/// Registered fields in registration order
#[derive(Default)]
pub(crate) struct FieldRegistry {
	entries: IndexMap<String, FieldEntry>,
}

impl FieldRegistry {
	pub(crate) fn get(&self, name: &str) -> Option<&FieldEntry> {
		self.entries.get(name)
	}

	pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldEntry> {
		self.entries.get_mut(name)
	}

	pub(crate) fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Insert or replace, keeping the original position of a replaced entry.
	pub(crate) fn insert(&mut self, name: String, entry: FieldEntry) -> Option<FieldEntry> {
		self.entries.insert(name, entry)
	}

	pub(crate) fn remove(&mut self, name: &str) -> Option<FieldEntry> {
		self.entries.shift_remove(name)
	}

	pub(crate) fn names(&self) -> Vec<String> {
		self.entries.keys().cloned().collect()
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &FieldEntry)> {
		self.entries.iter()
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.entries.len()
	}

	pub(crate) fn drain(&mut self) -> Vec<(String, FieldEntry)> {
		self.entries.drain(..).collect()
	}
}
