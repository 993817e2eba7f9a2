//! Watching field values

use super::{FormController, FormCore};
use crate::accessor::collect_values;
use crate::target::FieldTarget;
use crate::watch::HookWatchGuard;
use reinhardt_form_path as path;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

/// Who a watch read registers its paths for
enum WatchScope<'a> {
	/// The form host; changes re-render every state consumer
	Host,
	/// One hook subscriber
	Hook(&'a HookWatchGuard),
	/// Read only, nothing registered
	Peek,
}

impl WatchScope<'_> {
	fn add_paths(&self, form: &FormController, paths: Vec<String>) {
		match self {
			WatchScope::Host => form.core.watches.add_host_paths(paths),
			WatchScope::Hook(guard) => guard.add_paths(paths),
			WatchScope::Peek => {}
		}
	}
}

/// Value at `name` plus the leaf paths beneath it, when it has a value.
fn watched_value(values: &Value, name: &str) -> Option<(Value, Vec<String>)> {
	if path::is_empty_tree(values) {
		return None;
	}
	let value = path::get(values, name).filter(|value| !value.is_null())?;
	let leaves = if path::is_primitive(value) {
		Vec::new()
	} else {
		path::leaf_paths(name, value)
	};
	Some((value.clone(), leaves))
}

impl FormController {
	/// Read watched values and re-render the form host when they change
	///
	/// A single name yields its value (falling back to `default`, then to
	/// the configured default value), a list of names yields an object keyed
	/// by name, and [`FieldTarget::All`] yields every value and watches the
	/// whole form.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::FormBuilder;
	/// use serde_json::json;
	///
	/// let form = FormBuilder::new()
	/// 	.default_values(json!({"plan": "free"}))
	/// 	.build();
	///
	/// assert_eq!(form.watch("plan", None), json!("free"));
	/// assert_eq!(form.watch("seats", Some(json!(1))), json!(1));
	/// ```
	pub fn watch(&self, target: impl Into<FieldTarget>, default: Option<Value>) -> Value {
		self.watch_values(target.into(), default, WatchScope::Host)
	}

	/// Read values the way [`FormController::watch`] does without
	/// subscribing to anything.
	pub fn peek(&self, target: impl Into<FieldTarget>, default: Option<Value>) -> Value {
		self.watch_values(target.into(), default, WatchScope::Peek)
	}

	/// Subscribe `notify` to changes of the targeted fields
	///
	/// Only changes of the watched names, their nested leaves, or their
	/// field-array items notify this subscriber. Watching
	/// [`FieldTarget::All`] subscribes to every change. The subscription ends
	/// when the returned value is dropped.
	pub fn use_watch(
		&self,
		target: impl Into<FieldTarget>,
		default: Option<Value>,
		notify: impl Fn() + 'static,
	) -> WatchSubscription {
		let guard = self.core.watches.subscribe(Rc::new(notify));
		let target = target.into();
		self.watch_values(target.clone(), default.clone(), WatchScope::Hook(&guard));
		WatchSubscription {
			core: Rc::downgrade(&self.core),
			guard,
			target,
			default,
		}
	}

	fn watch_values(&self, target: FieldTarget, default: Option<Value>, scope: WatchScope<'_>) -> Value {
		let inner = self.core.inner.borrow();
		let prefixes = target.names();
		let values = collect_values(
			&inner.fields,
			&inner.shadow,
			(!prefixes.is_empty()).then_some(prefixes.as_slice()),
		);
		let fallback = |name: &str| -> Value {
			let defaults = default.as_ref().unwrap_or(&inner.default_values);
			match (&target, &default) {
				(FieldTarget::One(_), Some(default)) => default.clone(),
				_ => path::get(defaults, name).cloned().unwrap_or(Value::Null),
			}
		};

		match &target {
			FieldTarget::One(name) => {
				let watched = watched_value(&values, name);
				let leaves = watched.as_ref().map(|(_, leaves)| leaves.clone()).unwrap_or_default();
				scope.add_paths(self, std::iter::once(name.clone()).chain(leaves).collect());
				watched.map_or_else(|| fallback(name), |(value, _)| value)
			}
			FieldTarget::Many(names) => {
				let mut watched_values = Map::new();
				for name in names {
					let watched = watched_value(&values, name);
					let leaves = watched.as_ref().map(|(_, leaves)| leaves.clone()).unwrap_or_default();
					scope.add_paths(self, std::iter::once(name.clone()).chain(leaves).collect());
					watched_values.insert(
						name.clone(),
						watched.map_or_else(|| fallback(name), |(value, _)| value),
					);
				}
				Value::Object(watched_values)
			}
			FieldTarget::All => {
				if matches!(scope, WatchScope::Host) {
					self.core.watches.watch_all();
				}
				if path::is_empty_tree(&values) {
					default.unwrap_or_else(|| inner.default_values.clone())
				} else {
					values
				}
			}
		}
	}
}

/// A hook-level watch on some fields
///
/// Dropping it unsubscribes.
pub struct WatchSubscription {
	core: Weak<FormCore>,
	guard: HookWatchGuard,
	target: FieldTarget,
	default: Option<Value>,
}

impl WatchSubscription {
	/// Current value of the watched target, registering any newly appeared
	/// leaf paths
	pub fn value(&self) -> Value {
		match self.core.upgrade() {
			Some(core) => FormController { core }.watch_values(
				self.target.clone(),
				self.default.clone(),
				WatchScope::Hook(&self.guard),
			),
			None => self.default.clone().unwrap_or(Value::Null),
		}
	}

	/// Paths this subscriber is notified for; empty means every field.
	pub fn paths(&self) -> BTreeSet<String> {
		self.guard.paths()
	}

	pub fn target(&self) -> &FieldTarget {
		&self.target
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_watched_value_collects_leaves() {
		let values = json!({"items": [{"name": "a"}, {"name": "b"}]});

		let (value, leaves) = watched_value(&values, "items").expect("items present");

		assert_eq!(value, json!([{"name": "a"}, {"name": "b"}]));
		assert_eq!(leaves, vec!["items[0].name".to_string(), "items[1].name".to_string()]);
	}

	#[rstest]
	#[case(json!({}), "a")]
	#[case(json!({"a": null}), "a")]
	#[case(json!({"b": 1}), "a")]
	fn test_watched_value_missing(#[case] values: Value, #[case] name: &str) {
		assert!(watched_value(&values, name).is_none());
	}
}
