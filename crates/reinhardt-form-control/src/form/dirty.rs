//! Dirty tracking

use super::FormController;
use crate::state::FormStatePatch;
use reinhardt_form_path::{self as path, field_array_parent};
use serde_json::Value;

impl FormController {
	/// Recompute the dirty flags of `name` against its captured baseline.
	///
	/// Returns the patch only when `is_dirty` changed or the field's dirty
	/// entry appeared or disappeared; with `publish` the patch is applied
	/// regardless.
	pub(crate) fn update_dirty(&self, name: &str, publish: bool) -> Option<FormStatePatch> {
		let (patch, changed) = {
			let inner = self.core.inner.borrow();
			let entry = inner.fields.get(name)?;
			let current = crate::accessor::read_entry(entry);
			let baseline = inner.defaults_at_render.get(name).unwrap_or(&Value::Null);

			let (was_dirty, mut dirty_fields) =
				self.core.store.read(|s| (s.is_dirty, s.dirty_fields.clone()));
			let existed = path::get(&dirty_fields, name).is_some();
			if current != *baseline {
				path::set(&mut dirty_fields, name, Value::Bool(true));
			} else {
				path::unset(&mut dirty_fields, name);
			}
			let exists = path::get(&dirty_fields, name).is_some();

			let array_dirty = field_array_parent(name)
				.filter(|parent| inner.field_array_names.contains(*parent))
				.is_some_and(|parent| {
					let values = inner.values();
					path::get(&values, parent) != path::get(&inner.default_values, parent)
				});
			let is_dirty = array_dirty || !path::is_empty_tree(&dirty_fields);

			(
				FormStatePatch {
					is_dirty: Some(is_dirty),
					dirty_fields: Some(dirty_fields),
					..Default::default()
				},
				was_dirty != is_dirty || existed != exists,
			)
		};

		if publish {
			self.core.store.publish(patch.clone());
		}
		changed.then_some(patch)
	}
}
