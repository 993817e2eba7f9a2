//! Path addressing for nested form values
//!
//! Form field names such as `user.addresses[0].city` address a location
//! inside a nested JSON tree. This crate provides the small set of tree
//! operations the form engine builds on: reading, writing and removing the
//! value at a path, enumerating leaf paths, and merging trees.
//!
//! ## Path Syntax
//!
//! - Dots separate object keys: `profile.email`
//! - Brackets address array items: `tags[2]`
//! - Both forms may be mixed freely: `items[0].price`
//!
//! A segment that parses as an index no greater than [`MAX_INDEX`] addresses
//! an array slot when the container at that position is an array. Larger
//! numbers are plain object keys. When [`set`] has to create a
//! missing container it creates an array if the following segment is an
//! index and an object otherwise.
//!
//! ## Example
//!
//! ```
//! use reinhardt_form_path as path;
//! use serde_json::json;
//!
//! let mut values = json!({});
//! path::set(&mut values, "items[1].name", json!("bolt"));
//! assert_eq!(values, json!({"items": [null, {"name": "bolt"}]}));
//!
//! assert_eq!(path::get(&values, "items[1].name"), Some(&json!("bolt")));
//!
//! path::unset(&mut values, "items[1].name");
//! assert_eq!(values, json!({}));
//! ```

use serde_json::{Map, Value};

/// Largest segment treated as an array index.
pub const MAX_INDEX: usize = 65_535;

/// Split a path into its segments.
///
/// Quote characters inside brackets are ignored, so `a["b"]` and `a.b`
/// address the same location.
///
/// # Examples
///
/// ```
/// use reinhardt_form_path::split;
///
/// assert_eq!(split("a.b[0].c"), vec!["a", "b", "0", "c"]);
/// assert_eq!(split("name"), vec!["name"]);
/// ```
pub fn split(path: &str) -> Vec<&str> {
	path.split(['.', '['])
		.map(|segment| {
			segment
				.trim_end_matches(']')
				.trim_matches(|c| c == '"' || c == '\'')
		})
		.filter(|segment| !segment.is_empty())
		.collect()
}

/// Get a reference to the value stored at `path`.
///
/// Returns `None` when any segment along the way is missing.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
	split(path)
		.into_iter()
		.try_fold(tree, |node, segment| child(node, segment))
}

/// Get the value at `path`, treating a stored `null` as absent.
pub fn get_defined<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
	get(tree, path).filter(|value| !value.is_null())
}

/// Store `value` at `path`, creating intermediate containers as needed.
///
/// Any primitive found where a container is required is replaced.
pub fn set(tree: &mut Value, path: &str, value: Value) {
	let segments = split(path);
	let Some((last, parents)) = segments.split_last() else {
		return;
	};

	let mut node = tree;
	for (position, segment) in parents.iter().enumerate() {
		let next_is_index = index_of(segments[position + 1]).is_some();
		node = descend(node, segment, next_is_index);
	}
	assign(node, last, value);
}

/// Remove the value at `path`.
///
/// Parents left empty by the removal are pruned, so unsetting the only
/// leaf of a branch removes the whole branch. Array slots are cleared to
/// `null` instead of being removed, keeping sibling indices stable.
pub fn unset(tree: &mut Value, path: &str) {
	let segments = split(path);
	remove_at(tree, &segments);
}

/// List the path of every primitive leaf below `value`, prefixed by `prefix`.
///
/// A primitive `value` yields `prefix` itself.
///
/// # Examples
///
/// ```
/// use reinhardt_form_path::leaf_paths;
/// use serde_json::json;
///
/// let paths = leaf_paths("user", &json!({"name": "a", "tags": ["x", "y"]}));
/// assert_eq!(paths, vec!["user.name", "user.tags[0]", "user.tags[1]"]);
/// ```
pub fn leaf_paths(prefix: &str, value: &Value) -> Vec<String> {
	let mut paths = Vec::new();
	collect_leaves(prefix, value, &mut paths);
	paths
}

/// The part of a field name before its first array index.
///
/// `items[3].name` belongs to the array `items`. Names without an index
/// have no array parent.
pub fn field_array_parent(name: &str) -> Option<&str> {
	name.find('[').map(|end| &name[..end])
}

/// The first run of word characters in a path (`[A-Za-z0-9_]+`).
///
/// `items[0].name` and `items.name` both have the root segment `items`.
pub fn root_segment(path: &str) -> Option<&str> {
	let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
	let start = path.find(is_word)?;
	let rest = &path[start..];
	let end = rest.find(|c: char| !is_word(c)).unwrap_or(rest.len());
	Some(&rest[..end])
}

/// Merge `overlay` into `base`.
///
/// Objects present on both sides are merged key by key; any other value
/// from `overlay` replaces the one in `base`.
pub fn deep_merge(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base_map), Value::Object(overlay_map)) => {
			for (key, value) in overlay_map {
				match base_map.get_mut(&key) {
					Some(existing) if existing.is_object() && value.is_object() => {
						deep_merge(existing, value)
					}
					_ => {
						base_map.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}

/// Build a nested tree from `(path, value)` pairs.
///
/// # Examples
///
/// ```
/// use reinhardt_form_path::nest;
/// use serde_json::json;
///
/// let tree = nest([("a.b".to_string(), json!(1)), ("c".to_string(), json!(2))]);
/// assert_eq!(tree, json!({"a": {"b": 1}, "c": 2}));
/// ```
pub fn nest<I>(entries: I) -> Value
where
	I: IntoIterator<Item = (String, Value)>,
{
	let mut tree = Value::Object(Map::new());
	for (path, value) in entries {
		set(&mut tree, &path, value);
	}
	tree
}

/// Whether `value` is `null` or an object without keys.
pub fn is_empty_tree(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Object(map) => map.is_empty(),
		_ => false,
	}
}

/// Whether `value` is neither an object nor an array.
pub fn is_primitive(value: &Value) -> bool {
	!value.is_object() && !value.is_array()
}

fn index_of(segment: &str) -> Option<usize> {
	segment.parse().ok().filter(|index| *index <= MAX_INDEX)
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
	match node {
		Value::Object(map) => map.get(segment),
		Value::Array(items) => index_of(segment).and_then(|index| items.get(index)),
		_ => None,
	}
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
	match node {
		Value::Object(map) => map.get_mut(segment),
		Value::Array(items) => index_of(segment).and_then(move |index| items.get_mut(index)),
		_ => None,
	}
}

fn empty_container(array: bool) -> Value {
	if array {
		Value::Array(Vec::new())
	} else {
		Value::Object(Map::new())
	}
}

fn descend<'a>(node: &'a mut Value, segment: &str, next_is_index: bool) -> &'a mut Value {
	let index = index_of(segment).filter(|_| node.is_array());
	if index.is_none() && !node.is_object() {
		*node = Value::Object(Map::new());
	}

	let slot = match (node, index) {
		(Value::Array(items), Some(index)) => {
			if items.len() <= index {
				items.resize(index + 1, Value::Null);
			}
			&mut items[index]
		}
		(Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
		(other, _) => other,
	};

	if is_primitive(slot) {
		*slot = empty_container(next_is_index);
	}
	slot
}

fn assign(node: &mut Value, segment: &str, value: Value) {
	let index = index_of(segment).filter(|_| node.is_array());
	if index.is_none() && !node.is_object() {
		*node = Value::Object(Map::new());
	}

	match (node, index) {
		(Value::Array(items), Some(index)) => {
			if items.len() <= index {
				items.resize(index + 1, Value::Null);
			}
			items[index] = value;
		}
		(Value::Object(map), _) => {
			map.insert(segment.to_string(), value);
		}
		_ => {}
	}
}

fn remove_entry(node: &mut Value, segment: &str) {
	match node {
		Value::Object(map) => {
			map.remove(segment);
		}
		Value::Array(items) => {
			if let Some(slot) = index_of(segment).and_then(|index| items.get_mut(index)) {
				*slot = Value::Null;
			}
		}
		_ => {}
	}
}

fn remove_at(node: &mut Value, segments: &[&str]) {
	let Some((first, rest)) = segments.split_first() else {
		return;
	};
	if rest.is_empty() {
		remove_entry(node, first);
		return;
	}

	let prune = match child_mut(node, first) {
		Some(child) => {
			remove_at(child, rest);
			is_prunable(child)
		}
		None => return,
	};
	if prune {
		remove_entry(node, first);
	}
}

fn is_prunable(value: &Value) -> bool {
	match value {
		Value::Object(map) => map.is_empty(),
		Value::Array(items) => items
			.iter()
			.all(|item| item.is_null() || (!is_primitive(item) && is_prunable(item))),
		_ => false,
	}
}

fn collect_leaves(prefix: &str, value: &Value, paths: &mut Vec<String>) {
	match value {
		Value::Array(items) => {
			for (index, item) in items.iter().enumerate() {
				collect_leaves(&format!("{prefix}[{index}]"), item, paths);
			}
		}
		Value::Object(map) => {
			for (key, item) in map {
				collect_leaves(&format!("{prefix}.{key}"), item, paths);
			}
		}
		_ => paths.push(prefix.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("a", vec!["a"])]
	#[case("a.b.c", vec!["a", "b", "c"])]
	#[case("a[0]", vec!["a", "0"])]
	#[case("a[0].b[1]", vec!["a", "0", "b", "1"])]
	#[case("a[\"key\"]", vec!["a", "key"])]
	#[case("", vec![])]
	fn test_split(#[case] path: &str, #[case] expected: Vec<&str>) {
		assert_eq!(split(path), expected);
	}

	#[rstest]
	fn test_get_nested_object_and_array() {
		let tree = json!({"a": {"b": [10, {"c": "deep"}]}});

		assert_eq!(get(&tree, "a.b[0]"), Some(&json!(10)));
		assert_eq!(get(&tree, "a.b[1].c"), Some(&json!("deep")));
		assert_eq!(get(&tree, "a.b.1.c"), Some(&json!("deep")));
		assert_eq!(get(&tree, "a.x"), None);
		assert_eq!(get(&tree, "a.b[5]"), None);
	}

	#[rstest]
	fn test_get_defined_skips_null() {
		let tree = json!({"a": null, "b": 0});

		assert_eq!(get(&tree, "a"), Some(&Value::Null));
		assert_eq!(get_defined(&tree, "a"), None);
		assert_eq!(get_defined(&tree, "b"), Some(&json!(0)));
	}

	#[rstest]
	fn test_set_creates_objects() {
		let mut tree = json!({});
		set(&mut tree, "user.profile.name", json!("alice"));

		assert_eq!(tree, json!({"user": {"profile": {"name": "alice"}}}));
	}

	#[rstest]
	fn test_set_creates_array_for_index_segment() {
		let mut tree = json!({});
		set(&mut tree, "items[2]", json!("c"));

		assert_eq!(tree, json!({"items": [null, null, "c"]}));
	}

	#[rstest]
	#[case("rows[18446744073709551615]", "18446744073709551615")]
	#[case("rows[4000000000]", "4000000000")]
	#[case("rows[65536]", "65536")]
	fn test_set_out_of_range_index_is_object_key(#[case] path: &str, #[case] key: &str) {
		let mut tree = json!({});
		set(&mut tree, path, json!("x"));

		assert_eq!(tree, json!({"rows": {key: "x"}}));
		assert_eq!(get(&tree, path), Some(&json!("x")));
	}

	#[rstest]
	fn test_set_largest_index_stays_array() {
		let mut tree = json!({});
		set(&mut tree, &format!("rows[{MAX_INDEX}]"), json!(1));

		assert_eq!(tree["rows"].as_array().map(Vec::len), Some(MAX_INDEX + 1));
	}

	#[rstest]
	fn test_set_replaces_primitive_on_the_way() {
		let mut tree = json!({"a": "text"});
		set(&mut tree, "a.b", json!(true));

		assert_eq!(tree, json!({"a": {"b": true}}));
	}

	#[rstest]
	fn test_set_on_null_root() {
		let mut tree = Value::Null;
		set(&mut tree, "a", json!(1));

		assert_eq!(tree, json!({"a": 1}));
	}

	#[rstest]
	fn test_unset_prunes_empty_parents() {
		let mut tree = json!({"a": {"b": {"c": true}}, "d": true});
		unset(&mut tree, "a.b.c");

		assert_eq!(tree, json!({"d": true}));
	}

	#[rstest]
	fn test_unset_keeps_non_empty_siblings() {
		let mut tree = json!({"a": {"b": true, "c": true}});
		unset(&mut tree, "a.b");

		assert_eq!(tree, json!({"a": {"c": true}}));
	}

	#[rstest]
	fn test_unset_array_slot_keeps_indices() {
		let mut tree = json!({"items": [true, true]});
		unset(&mut tree, "items[0]");

		assert_eq!(tree, json!({"items": [null, true]}));

		unset(&mut tree, "items[1]");
		assert_eq!(tree, json!({}));
	}

	#[rstest]
	fn test_unset_missing_path_is_noop() {
		let mut tree = json!({"a": 1});
		unset(&mut tree, "x.y");

		assert_eq!(tree, json!({"a": 1}));
	}

	#[rstest]
	fn test_leaf_paths_of_primitive() {
		assert_eq!(leaf_paths("name", &json!("x")), vec!["name"]);
	}

	#[rstest]
	#[case("items[0].name", Some("items"))]
	#[case("items", None)]
	#[case("a.b[1]", Some("a.b"))]
	fn test_field_array_parent(#[case] name: &str, #[case] expected: Option<&str>) {
		assert_eq!(field_array_parent(name), expected);
	}

	#[rstest]
	#[case("items[0].name", Some("items"))]
	#[case("first.second", Some("first"))]
	#[case("[0]", Some("0"))]
	#[case("..", None)]
	fn test_root_segment(#[case] path: &str, #[case] expected: Option<&str>) {
		assert_eq!(root_segment(path), expected);
	}

	#[rstest]
	fn test_deep_merge() {
		let mut base = json!({"a": {"x": 1, "y": 2}, "b": 1});
		deep_merge(&mut base, json!({"a": {"y": 3}, "c": 4}));

		assert_eq!(base, json!({"a": {"x": 1, "y": 3}, "b": 1, "c": 4}));
	}

	#[rstest]
	fn test_is_empty_tree() {
		assert!(is_empty_tree(&Value::Null));
		assert!(is_empty_tree(&json!({})));
		assert!(!is_empty_tree(&json!({"a": true})));
		assert!(!is_empty_tree(&json!("")));
	}
}
