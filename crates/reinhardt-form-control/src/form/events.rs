//! Change and blur handling

use super::FormController;
use crate::config::should_skip_validation;
use crate::handle::{EventKind, FieldEvent};
use crate::rules;
use crate::state::FormStatePatch;
use reinhardt_form_path as path;
use serde_json::Value;

impl FormController {
	/// React to an input event from a bound handle.
	///
	/// Dirty state and touched state are always updated; validation runs
	/// only when the mode asks for it.
	pub(crate) async fn handle_event(&self, event: FieldEvent) {
		let FieldEvent { kind, name } = event;
		if !self.is_registered(&name) {
			return;
		}
		let is_blur = kind == EventKind::Blur;
		let (is_submitted, was_touched) = self
			.core
			.store
			.read(|s| (s.is_submitted, s.is_field_touched(&name)));
		let skip = should_skip_validation(
			self.core.mode,
			self.core.re_validate,
			is_blur,
			is_submitted,
			was_touched,
		);
		let watched = self.core.watches.is_field_watched(&name);

		if is_blur && !was_touched {
			let mut touched = self.core.store.read(|s| s.touched.clone());
			path::set(&mut touched, &name, Value::Bool(true));
			self.core.store.publish(FormStatePatch {
				touched: Some(touched),
				..Default::default()
			});
		}

		if skip {
			let dirty = self.update_dirty(&name, false);
			self.core.watches.hook_notifications(&name).fire();
			self.publish_or_rerender(dirty, watched);
			return;
		}

		tracing::trace!(field = %name, blur = is_blur, "validating on event");
		let (error, resolver_valid, stale) = match self.core.resolver.clone() {
			Some(resolver) => {
				let values = self.values();
				let result = resolver
					.resolve(&values, self.core.options.context.as_ref(), self.criteria())
					.await;
				let current = self.values();
				let stale = path::get(&current, &name) != path::get(&values, &name);
				// Another field moved on meanwhile; its own event owns the verdict.
				let form_valid = if current == values {
					result.errors.is_empty()
				} else {
					self.core.store.read(|s| s.is_valid)
				};
				(result.errors.get(&name).cloned(), Some(form_valid), stale)
			}
			None => {
				let Some((rules, value, _)) = self.rule_input(&name) else {
					return;
				};
				let error = rules::validate_value(&value, &rules, self.criteria()).await;
				(error, None, !self.holds_value(&name, &value))
			}
		};

		if !self.is_registered(&name) {
			tracing::debug!(field = %name, "field removed during validation, result discarded");
			return;
		}
		// Re-read after the await so dirty changes made by other events survive.
		let dirty = self.update_dirty(&name, false);
		if stale {
			tracing::debug!(field = %name, "value changed during validation, result discarded");
			if let Some(patch) = dirty {
				self.core.store.publish(patch);
			}
			return;
		}
		let should_render = dirty.is_some()
			|| watched
			|| resolver_valid.is_some_and(|valid| valid != self.core.store.read(|s| s.is_valid));
		let error = error.map(|error| error.with_ref(self.primary_handle(&name)));
		self.core.watches.hook_notifications(&name).fire();
		let patch = self.reconcile(&name, error, should_render, dirty, resolver_valid);
		self.publish_or_rerender(patch, watched);
	}
}
