//! Field registration and removal

use super::{FormController, FormInner};
use crate::accessor::{is_truthy, read_entry, write_entry};
use crate::error::{FormError, FormResult};
use crate::handle::{HandleRef, InputKind, RemovalWatch, same_handle};
use crate::registry::{BoundHandle, FieldBinding, FieldEntry};
use crate::rules::{self, ValidationRules};
use crate::state::FormStatePatch;
use crate::target::FieldTarget;
use futures::future::LocalBoxFuture;
use regex::Regex;
use reinhardt_form_path as path;
use serde_json::Value;
use std::rc::Rc;

/// Validation to run once a field has been bound
enum Seed {
	Resolver,
	Rules,
	Skip,
}

/// `items[3]` → `items`; any other name is returned unchanged.
fn strip_trailing_index(name: &str) -> &str {
	name.strip_suffix(']')
		.and_then(|rest| rest.rfind('[').map(|open| (&rest[..open], &rest[open + 1..])))
		.filter(|(_, index)| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
		.map_or(name, |(base, _)| base)
}

impl FormController {
	/// Bind an input handle to the form under its name
	///
	/// Writes the field's default value into the handle, captures the
	/// dirty-tracking baseline, attaches the change listener and, outside
	/// `on_submit` mode, runs a silent validation that only affects
	/// `is_valid`. Registering a handle that is already bound just replaces
	/// its rules.
	///
	/// # Arguments
	///
	/// * `handle` - The input to bind
	/// * `rules` - Built-in and custom validation rules for the field
	///
	/// # Errors
	///
	/// * [`FormError::MissingName`] when the handle has an empty name
	/// * [`FormError::MalformedFieldArrayName`] when a field-array member is
	///   not named `array[index].key`
	/// * [`FormError::Disposed`] after [`FormController::dispose`]
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_control::memory::MemoryInput;
	/// use reinhardt_form_control::{FormBuilder, InputHandle, ValidationRules};
	/// use serde_json::json;
	///
	/// # futures::executor::block_on(async {
	/// let form = FormBuilder::new()
	/// 	.default_values(json!({"name": "Ada"}))
	/// 	.build();
	/// let name = MemoryInput::text("name");
	///
	/// form.register(name.handle(), ValidationRules::new()).await.unwrap();
	///
	/// assert_eq!(name.value(), json!("Ada"));
	/// # });
	/// ```
	pub async fn register(&self, handle: HandleRef, rules: ValidationRules) -> FormResult<()> {
		let name = handle.name();
		self.check_registration(&name)?;
		let kind = handle.kind();
		let has_rules = !rules.is_empty();

		if self.update_rules(&name, &handle, &rules) {
			return Ok(());
		}

		let watch = self.observe_removal(&name, &handle, kind);

		let seed = {
			let mut guard = self.core.inner.borrow_mut();
			let inner = &mut *guard;
			let bound = BoundHandle::new(handle.clone(), watch);

			let joined_group = match inner.fields.get_mut(&name) {
				Some(entry) if kind.is_radio_or_checkbox() => match entry.binding.options_mut() {
					Some(options) => {
						options.push(bound);
						entry.rules = rules;
						None
					}
					None => Some((bound, rules)),
				},
				_ => Some((bound, rules)),
			};
			if let Some((bound, rules)) = joined_group {
				let replaced = inner.fields.insert(
					name.clone(),
					FieldEntry {
						binding: FieldBinding::single(kind, bound),
						rules,
					},
				);
				if let Some(previous) = replaced {
					for old in previous.handles() {
						if !same_handle(&old, &handle) {
							old.detach();
						}
					}
				}
			}

			let (default_value, is_field_array) = Self::apply_default(inner, &name);
			Self::capture_baseline(inner, &name, default_value, is_field_array);

			if kind != InputKind::Custom {
				handle.attach(self.core.listener.clone());
			}

			if self.validates_with_resolver(inner, &name) {
				Seed::Resolver
			} else if has_rules {
				inner.fields_with_rules.insert(name.clone());
				if self.core.mode.is_on_submit {
					Seed::Skip
				} else {
					Seed::Rules
				}
			} else {
				Seed::Skip
			}
		};

		tracing::debug!(field = %name, kind = ?kind, "field registered");

		match seed {
			Seed::Resolver => self.validate_resolver_validity().await,
			Seed::Rules => self.seed_field(&name).await,
			Seed::Skip => {}
		}
		Ok(())
	}

	fn check_registration(&self, name: &str) -> FormResult<()> {
		let inner = self.core.inner.borrow();
		if inner.disposed {
			return Err(FormError::Disposed);
		}
		if name.is_empty() {
			tracing::warn!("input is missing a `name`, registration ignored");
			return Err(FormError::MissingName);
		}

		let base = strip_trailing_index(name);
		if inner.field_array_names.contains(base) {
			let shape = Regex::new(&format!(r"^{}\[\d+\]\.\w+", regex::escape(base)));
			if !shape.is_ok_and(|shape| shape.is_match(name)) {
				tracing::warn!(
					field = %name,
					"field array member must be named `{base}[index].key`"
				);
				return Err(FormError::MalformedFieldArrayName(name.to_string()));
			}
		}
		Ok(())
	}

	/// Replace the rules of an already bound handle; `false` when the handle
	/// is not bound yet.
	fn update_rules(&self, name: &str, handle: &HandleRef, rules: &ValidationRules) -> bool {
		let mut guard = self.core.inner.borrow_mut();
		let inner = &mut *guard;
		let Some(entry) = inner.fields.get_mut(name) else {
			return false;
		};
		if !entry.contains(handle) {
			return false;
		}

		let had_rules = !entry.rules.is_empty();
		entry.rules = rules.clone();
		let has_rules = !rules.is_empty();
		if had_rules != has_rules {
			if has_rules {
				inner.fields_with_rules.insert(name.to_string());
			} else {
				inner.fields_with_rules.remove(name);
				inner.valid_fields.remove(name);
			}
		}
		tracing::trace!(field = %name, "rules updated");
		true
	}

	/// Write the shadow or configured default into the new binding.
	///
	/// Field-array members receive their values from the array instead.
	fn apply_default(inner: &mut FormInner, name: &str) -> (Option<Value>, bool) {
		let shadow_value = path::get_defined(&inner.shadow, name).cloned();
		if path::is_empty_tree(&inner.default_values) && shadow_value.is_none() {
			return (None, false);
		}

		let default_value =
			shadow_value.or_else(|| path::get_defined(&inner.default_values, name).cloned());
		let is_field_array = inner.is_in_field_array(name);
		if let (Some(value), false) = (&default_value, is_field_array) {
			if let Some(entry) = inner.fields.get(name) {
				write_entry(entry, value);
			}
		}
		(default_value, is_field_array)
	}

	/// Record the value dirty tracking compares against, once per field.
	fn capture_baseline(
		inner: &mut FormInner,
		name: &str,
		default_value: Option<Value>,
		is_field_array: bool,
	) {
		let captured = inner.defaults_at_render.get(name).is_some_and(is_truthy);
		if captured || (is_field_array && default_value.is_none()) {
			return;
		}
		let baseline = match default_value {
			Some(value) => value,
			None => inner.fields.get(name).map(read_entry).unwrap_or(Value::Null),
		};
		inner.defaults_at_render.insert(name.to_string(), baseline);
	}

	fn observe_removal(&self, name: &str, handle: &HandleRef, kind: InputKind) -> Option<RemovalWatch> {
		if kind == InputKind::Custom {
			return None;
		}
		let observer = self.core.removal_observer.as_ref()?;
		let weak = Rc::downgrade(&self.core);
		let name = name.to_string();
		let removed = handle.clone();

		Some(observer.observe(
			handle,
			Box::new(move || -> LocalBoxFuture<'static, ()> {
				Box::pin(async move {
					if let Some(core) = weak.upgrade() {
						FormController { core }
							.remove_field(&name, Some(&removed), false)
							.await;
					}
				})
			}),
		))
	}

	/// Silent validation of a freshly bound field; only `is_valid` changes.
	pub(crate) async fn seed_field(&self, name: &str) {
		let Some((rules, value, _)) = self.rule_input(name) else {
			return;
		};
		let error = rules::validate_value(&value, &rules, self.criteria()).await;

		let patch = {
			let mut inner = self.core.inner.borrow_mut();
			if !inner.fields.contains(name) {
				tracing::debug!(field = %name, "field removed during validation, result discarded");
				return;
			}
			if error.is_none() {
				inner.valid_fields.insert(name.to_string());
			}
			let (current, errors) = self.core.store.read(|s| (s.is_valid, s.errors.clone()));
			let is_valid = match self.rule_validity(&inner, &errors) {
				Some(formula) => formula,
				None => current && error.is_none(),
			};
			(is_valid != current).then(|| FormStatePatch {
				is_valid: Some(is_valid),
				..Default::default()
			})
		};

		if let Some(patch) = patch {
			self.core.store.publish(patch);
		}
	}

	/// Unbind one field, several fields, or every field
	///
	/// Unlike automatic removal this also drops field-array members.
	pub async fn unregister(&self, target: impl Into<FieldTarget>) {
		let names = match target.into() {
			FieldTarget::All => self.field_names(),
			target => target.names(),
		};
		for name in names {
			self.remove_field(&name, None, true).await;
		}
	}

	/// Remove `name` after its handle left the host tree, or unconditionally
	/// when `force` is set.
	pub(crate) async fn remove_field(&self, name: &str, removed: Option<&HandleRef>, force: bool) {
		let patch = {
			let mut guard = self.core.inner.borrow_mut();
			let inner = &mut *guard;
			if !inner.fields.contains(name) || (inner.is_in_field_array(name) && !force) {
				return;
			}

			if !self.core.options.should_unregister {
				let value = inner.value_of(name);
				if !value.is_null() {
					path::set(&mut inner.shadow, name, value);
				}
			}

			let Some(entry) = inner.fields.get_mut(name) else {
				return;
			};
			let fully_removed = match removed {
				Some(removed) if !force => {
					if !entry.contains(removed) {
						false
					} else if let Some(options) = entry.binding.options_mut() {
						options.retain(|option| {
							let keep = !same_handle(&option.handle, removed);
							if !keep {
								option.handle.detach();
							}
							keep
						});
						options.is_empty()
					} else {
						true
					}
				}
				_ => true,
			};
			if !fully_removed {
				tracing::trace!(field = %name, "option removed from group");
				return;
			}

			if let Some(entry) = inner.fields.remove(name) {
				for handle in entry.handles() {
					handle.detach();
				}
			}
			tracing::debug!(field = %name, "field removed");

			if !self.core.options.should_unregister {
				return;
			}

			inner.defaults_at_render.remove(name);
			inner.fields_with_rules.remove(name);
			inner.valid_fields.remove(name);
			let (mut errors, mut dirty_fields, mut touched) = self
				.core
				.store
				.read(|s| (s.errors.clone(), s.dirty_fields.clone(), s.touched.clone()));
			errors.remove(name);
			path::unset(&mut dirty_fields, name);
			path::unset(&mut touched, name);

			FormStatePatch {
				is_dirty: Some(!path::is_empty_tree(&dirty_fields)),
				is_valid: self.rule_validity(inner, &errors),
				errors: Some(errors),
				dirty_fields: Some(dirty_fields),
				touched: Some(touched),
				..Default::default()
			}
		};

		self.core.store.publish(patch);
		if self.core.resolver.is_some() {
			self.validate_resolver_validity().await;
		}
	}
}
