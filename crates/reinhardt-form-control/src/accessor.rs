//! Reading and writing field values by binding kind

use crate::registry::{FieldBinding, FieldEntry, FieldRegistry};
use reinhardt_form_path as path;
use serde_json::Value;

/// The current value of a registered field
///
/// - radio: value of the checked option, `null` when none is checked
/// - checkbox group: array of the checked option values
/// - single checkbox: its checked state
/// - multi-select: array of selected values
/// - file: the live file list
/// - anything else: the handle's value
pub(crate) fn read_entry(entry: &FieldEntry) -> Value {
	match &entry.binding {
		FieldBinding::Radio(options) => options
			.iter()
			.find(|option| option.handle.is_checked())
			.map(|option| option.handle.value())
			.unwrap_or(Value::Null),
		FieldBinding::Checkbox(options) if options.len() > 1 => Value::Array(
			options
				.iter()
				.filter(|option| option.handle.is_checked())
				.map(|option| option.handle.value())
				.collect(),
		),
		FieldBinding::Checkbox(options) => Value::Bool(
			options
				.first()
				.is_some_and(|option| option.handle.is_checked()),
		),
		FieldBinding::Select {
			bound,
			multiple: true,
		} => Value::Array(bound.handle.selected_values()),
		FieldBinding::File(bound) => bound.handle.files(),
		FieldBinding::Text(bound)
		| FieldBinding::Select { bound, .. }
		| FieldBinding::Custom(bound) => bound.handle.value(),
	}
}

/// Write `value` to every handle of the field
///
/// `null` is written as an empty string.
pub(crate) fn write_entry(entry: &FieldEntry, value: &Value) {
	let value = match value {
		Value::Null => Value::String(String::new()),
		other => other.clone(),
	};

	match &entry.binding {
		FieldBinding::Radio(options) => {
			for option in options {
				option.handle.set_checked(option.handle.value() == value);
			}
		}
		FieldBinding::Checkbox(options) if options.len() > 1 => {
			for option in options {
				let option_value = option.handle.value();
				let checked = match &value {
					Value::Array(items) => items.contains(&option_value),
					other => *other == option_value,
				};
				option.handle.set_checked(checked);
			}
		}
		FieldBinding::Checkbox(options) => {
			if let Some(option) = options.first() {
				option.handle.set_checked(is_truthy(&value));
			}
		}
		FieldBinding::Select {
			bound,
			multiple: true,
		} => {
			let selected = match value {
				Value::Array(items) => items,
				other => vec![other],
			};
			bound.handle.set_selected_values(&selected);
		}
		FieldBinding::File(bound) if !value.is_string() => bound.handle.set_files(value),
		FieldBinding::File(bound)
		| FieldBinding::Text(bound)
		| FieldBinding::Select { bound, .. }
		| FieldBinding::Custom(bound) => bound.handle.set_value(value),
	}
}

pub(crate) fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// Value of `name` from its live handle, else from the shadow store
pub(crate) fn field_value(registry: &FieldRegistry, shadow: &Value, name: &str) -> Value {
	match registry.get(name) {
		Some(entry) => read_entry(entry),
		None => path::get(shadow, name).cloned().unwrap_or(Value::Null),
	}
}

/// Nested values of registered fields whose name starts with one of
/// `prefixes` (all fields when `prefixes` is `None`), layered over the
/// shadow store
pub(crate) fn collect_values(
	registry: &FieldRegistry,
	shadow: &Value,
	prefixes: Option<&[String]>,
) -> Value {
	let mut values = shadow.clone();
	if !values.is_object() {
		values = Value::Object(Default::default());
	}
	for (name, entry) in registry.iter() {
		let selected = prefixes.is_none_or(|prefixes| {
			prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
		});
		if selected {
			path::set(&mut values, name, read_entry(entry));
		}
	}
	values
}
