//! Programmatic value access

use super::FormController;
use crate::accessor::write_entry;
use crate::state::empty_tree;
use crate::target::FieldTarget;
use reinhardt_form_path as path;
use serde_json::{Map, Value};

/// Side effects of [`FormController::set_value`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetValueOptions {
	/// Recompute dirty state for the written field(s)
	pub should_dirty: bool,
	/// Validate the written field(s) afterwards
	pub should_validate: bool,
}

impl SetValueOptions {
	pub fn should_dirty(mut self, enabled: bool) -> Self {
		self.should_dirty = enabled;
		self
	}

	pub fn should_validate(mut self, enabled: bool) -> Self {
		self.should_validate = enabled;
		self
	}
}

impl FormController {
	/// Current values
	///
	/// A single name yields that field's value, a list of names yields an
	/// object keyed by the given names, and [`FieldTarget::All`] yields the
	/// nested value tree of the whole form, including kept values of
	/// removed fields.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::memory::MemoryInput;
	/// use reinhardt_form_control::{FieldTarget, FormBuilder, ValidationRules};
	/// use serde_json::json;
	///
	/// # futures::executor::block_on(async {
	/// let form = FormBuilder::new().build();
	/// let city = MemoryInput::text_with("address.city", "Oslo");
	/// form.register(city.handle(), ValidationRules::new()).await.unwrap();
	///
	/// assert_eq!(form.get_values("address.city"), json!("Oslo"));
	/// assert_eq!(form.get_values(["address.city"]), json!({"address.city": "Oslo"}));
	/// assert_eq!(form.get_values(FieldTarget::All), json!({"address": {"city": "Oslo"}}));
	/// # });
	/// ```
	pub fn get_values(&self, target: impl Into<FieldTarget>) -> Value {
		let inner = self.core.inner.borrow();
		match target.into() {
			FieldTarget::All => inner.values(),
			FieldTarget::One(name) => inner.value_of(&name),
			FieldTarget::Many(names) => Value::Object(
				names
					.into_iter()
					.map(|name| {
						let value = inner.value_of(&name);
						(name, value)
					})
					.collect::<Map<_, _>>(),
			),
		}
	}

	/// Write a value programmatically
	///
	/// A registered name is written directly. An object or array addressed
	/// to an unregistered parent path is spread over the registered leaf
	/// fields underneath it. Without a registered target the value is kept
	/// in the shadow store when removed fields keep their values.
	///
	/// # Arguments
	///
	/// * `name` - Field name or parent path
	/// * `value` - The value to write
	/// * `options` - Whether to update dirty state and validate
	pub async fn set_value(&self, name: &str, value: Value, options: SetValueOptions) {
		let (written, direct) = {
			let mut guard = self.core.inner.borrow_mut();
			let inner = &mut *guard;

			if let Some(entry) = inner.fields.get(name) {
				write_entry(entry, &value);
				(vec![name.to_string()], true)
			} else {
				let mut written = Vec::new();
				if !path::is_primitive(&value) {
					let mut scoped = empty_tree();
					path::set(&mut scoped, name, value.clone());
					for leaf in path::leaf_paths(name, &value) {
						if let Some(entry) = inner.fields.get(&leaf) {
							write_entry(entry, path::get(&scoped, &leaf).unwrap_or(&Value::Null));
							written.push(leaf);
						}
					}
				}
				if !self.core.options.should_unregister {
					path::set(&mut inner.shadow, name, value);
				}
				(written, false)
			}
		};

		tracing::trace!(field = %name, fields = ?written, "value set");
		for field in &written {
			if options.should_dirty {
				self.update_dirty(field, true);
			}
			if !direct && options.should_validate {
				self.trigger(field.as_str()).await;
			}
		}

		self.core.watches.hook_notifications(name).fire();
		if self.core.watches.is_field_watched(name) {
			self.rerender();
		}
		if options.should_validate {
			self.trigger(name).await;
		}
	}
}
