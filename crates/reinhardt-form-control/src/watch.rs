//! Watch subscription bookkeeping
//!
//! Two kinds of watchers exist:
//!
//! - the form host, which either watches everything or a set of names and is
//!   re-rendered through every state consumer;
//! - per-hook subscribers, each with its own path set and callback. An empty
//!   set means the hook watches every field.

use crate::state::Notifications;
use indexmap::IndexMap;
use reinhardt_form_path::{field_array_parent, root_segment};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

struct HookWatch {
	paths: BTreeSet<String>,
	notify: Rc<dyn Fn()>,
}

#[derive(Default)]
struct WatchTable {
	watch_all: bool,
	host_paths: BTreeSet<String>,
	hooks: IndexMap<u64, HookWatch>,
	next_id: u64,
}

#[derive(Default)]
pub(crate) struct WatchRegistry {
	table: Rc<RefCell<WatchTable>>,
}

impl WatchRegistry {
	pub(crate) fn watch_all(&self) {
		self.table.borrow_mut().watch_all = true;
	}

	pub(crate) fn add_host_paths<I: IntoIterator<Item = String>>(&self, paths: I) {
		self.table.borrow_mut().host_paths.extend(paths);
	}

	/// Whether a change of `name` re-renders the form host.
	///
	/// `items[0].name` is watched when the host watches `items`.
	pub(crate) fn is_field_watched(&self, name: &str) -> bool {
		let table = self.table.borrow();
		table.watch_all
			|| table.host_paths.contains(name)
			|| root_segment(name).is_some_and(|root| table.host_paths.contains(root))
	}

	/// Hook subscribers interested in a change of `name`.
	///
	/// An empty `name` addresses every hook.
	pub(crate) fn hook_notifications(&self, name: &str) -> Notifications {
		let table = self.table.borrow();
		let parent = field_array_parent(name);
		let mut notifications = Notifications::default();
		for hook in table.hooks.values() {
			if name.is_empty()
				|| hook.paths.is_empty()
				|| hook.paths.contains(name)
				|| parent.is_some_and(|parent| hook.paths.contains(parent))
			{
				notifications.push(hook.notify.clone());
			}
		}
		notifications
	}

	pub(crate) fn subscribe(&self, notify: Rc<dyn Fn()>) -> HookWatchGuard {
		let mut table = self.table.borrow_mut();
		table.next_id += 1;
		let id = table.next_id;
		table.hooks.insert(
			id,
			HookWatch {
				paths: BTreeSet::new(),
				notify,
			},
		);
		HookWatchGuard {
			id,
			table: Rc::downgrade(&self.table),
		}
	}

	pub(crate) fn clear_host(&self) {
		let mut table = self.table.borrow_mut();
		table.watch_all = false;
		table.host_paths.clear();
	}

	pub(crate) fn clear(&self) {
		let mut table = self.table.borrow_mut();
		table.watch_all = false;
		table.host_paths.clear();
		table.hooks.clear();
	}

	#[cfg(test)]
	fn hook_count(&self) -> usize {
		self.table.borrow().hooks.len()
	}
}

/// Keeps one hook subscriber registered; removes it on drop
pub(crate) struct HookWatchGuard {
	id: u64,
	table: Weak<RefCell<WatchTable>>,
}

impl HookWatchGuard {
	pub(crate) fn add_paths<I: IntoIterator<Item = String>>(&self, paths: I) {
		let Some(table) = self.table.upgrade() else {
			return;
		};
		let mut table = table.borrow_mut();
		if let Some(hook) = table.hooks.get_mut(&self.id) {
			hook.paths.extend(paths);
		}
	}

	pub(crate) fn paths(&self) -> BTreeSet<String> {
		self.table
			.upgrade()
			.and_then(|table| {
				table
					.borrow()
					.hooks
					.get(&self.id)
					.map(|hook| hook.paths.clone())
			})
			.unwrap_or_default()
	}
}

impl Drop for HookWatchGuard {
	fn drop(&mut self) {
		let Some(table) = self.table.upgrade() else {
			return;
		};
		if let Ok(mut table) = table.try_borrow_mut() {
			table.hooks.shift_remove(&self.id);
		}
	}
}
