//! Bookkeeping shared with field-array helpers
//!
//! A field array owns names of the form `items[index].key`. Its members are
//! not removed when their handles disappear (the array decides), do not
//! receive default values on registration, and make the form dirty whenever
//! the array's values differ from its default values.

use super::FormController;
use reinhardt_form_path as path;
use serde_json::Value;
use std::rc::Rc;

impl FormController {
	/// Declare `name` as a field array
	pub fn register_field_array(&self, name: &str) {
		tracing::debug!(field_array = %name, "field array registered");
		self.core
			.inner
			.borrow_mut()
			.field_array_names
			.insert(name.to_string());
	}

	/// Drop `name` as a field array together with its reset callback and
	/// stored defaults
	pub fn unregister_field_array(&self, name: &str) {
		let mut inner = self.core.inner.borrow_mut();
		inner.field_array_names.remove(name);
		inner.field_array_resets.remove(name);
		inner.field_array_defaults.remove(name);
	}

	pub fn is_field_array(&self, name: &str) -> bool {
		self.core.inner.borrow().field_array_names.contains(name)
	}

	/// Callback run by [`FormController::reset`] so the array can rebuild
	/// its items
	pub fn set_field_array_reset(&self, name: &str, reset: impl Fn() + 'static) {
		self.core
			.inner
			.borrow_mut()
			.field_array_resets
			.insert(name.to_string(), Rc::new(reset));
	}

	pub fn remove_field_array_reset(&self, name: &str) {
		self.core.inner.borrow_mut().field_array_resets.remove(name);
	}

	/// Default items of the array: the stored override, else the configured
	/// default value at `name`
	pub fn field_array_defaults(&self, name: &str) -> Option<Value> {
		let inner = self.core.inner.borrow();
		inner
			.field_array_defaults
			.get(name)
			.or_else(|| path::get_defined(&inner.default_values, name))
			.cloned()
	}

	/// Override the default items of the array until the next reset
	pub fn set_field_array_defaults(&self, name: &str, values: Value) {
		self.core
			.inner
			.borrow_mut()
			.field_array_defaults
			.insert(name.to_string(), values);
	}
}
