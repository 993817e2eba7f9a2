//! Field selection for multi-field operations

/// Which fields an operation applies to
///
/// Converts from a single name, a list of names, or [`FieldTarget::All`]:
///
/// ```
/// use reinhardt_form_control::FieldTarget;
///
/// assert_eq!(FieldTarget::from("email"), FieldTarget::One("email".to_string()));
/// assert_eq!(
/// 	FieldTarget::from(["a", "b"]),
/// 	FieldTarget::Many(vec!["a".to_string(), "b".to_string()])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldTarget {
	#[default]
	All,
	One(String),
	Many(Vec<String>),
}

impl FieldTarget {
	/// Names listed by the target; empty for [`FieldTarget::All`].
	pub fn names(&self) -> Vec<String> {
		match self {
			FieldTarget::All => Vec::new(),
			FieldTarget::One(name) => vec![name.clone()],
			FieldTarget::Many(names) => names.clone(),
		}
	}
}

impl From<&str> for FieldTarget {
	fn from(name: &str) -> Self {
		FieldTarget::One(name.to_string())
	}
}

impl From<String> for FieldTarget {
	fn from(name: String) -> Self {
		FieldTarget::One(name)
	}
}

impl From<&String> for FieldTarget {
	fn from(name: &String) -> Self {
		FieldTarget::One(name.clone())
	}
}

impl From<Vec<String>> for FieldTarget {
	fn from(names: Vec<String>) -> Self {
		FieldTarget::Many(names)
	}
}

impl From<Vec<&str>> for FieldTarget {
	fn from(names: Vec<&str>) -> Self {
		FieldTarget::Many(names.into_iter().map(str::to_string).collect())
	}
}

impl From<&[&str]> for FieldTarget {
	fn from(names: &[&str]) -> Self {
		FieldTarget::Many(names.iter().map(|name| name.to_string()).collect())
	}
}

impl<const N: usize> From<[&str; N]> for FieldTarget {
	fn from(names: [&str; N]) -> Self {
		FieldTarget::Many(names.iter().map(|name| name.to_string()).collect())
	}
}
