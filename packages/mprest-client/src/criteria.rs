use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Matches the server's own quoting: alphanumerics plus `-_.~/` pass through.
const QUERY_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~').remove(b'/');

/// A single filter value before wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	Text(String),
	Int(i64),
	Number(f64),
	Bool(bool),
	/// Comma-joined on the wire.
	List(Vec<String>),
	/// Expands to `<field>_min` and `<field>_max`.
	Range { min: f64, max: f64 },
}
impl From<&str> for FilterValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<String> for FilterValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<i64> for FilterValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for FilterValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}
impl From<bool> for FilterValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<Vec<String>> for FilterValue {
	fn from(value: Vec<String>) -> Self {
		Self::List(value)
	}
}
impl From<(f64, f64)> for FilterValue {
	fn from((min, max): (f64, f64)) -> Self {
		Self::Range { min, max }
	}
}

/// The wire-ready query parameter set for one request.
///
/// Keys prefixed with `_` are pagination/projection bookkeeping; everything
/// else is a user filter field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
	params: BTreeMap<String, String>,
}

impl Criteria {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a filter value, dropping absent ones entirely.
	pub fn filter(mut self, field: &str, value: Option<impl Into<FilterValue>>) -> Self {
		if let Some(value) = value {
			self.set(field, value.into());
		}

		self
	}

	pub fn set(&mut self, field: &str, value: FilterValue) {
		match value {
			FilterValue::Text(text) => {
				self.params.insert(field.to_string(), text);
			},
			FilterValue::Int(int) => {
				self.params.insert(field.to_string(), int.to_string());
			},
			FilterValue::Number(number) => {
				self.params.insert(field.to_string(), number.to_string());
			},
			FilterValue::Bool(flag) => {
				self.params.insert(field.to_string(), flag.to_string());
			},
			FilterValue::List(values) => {
				self.params.insert(field.to_string(), values.join(","));
			},
			FilterValue::Range { min, max } => {
				self.params.insert(format!("{field}_min"), min.to_string());
				self.params.insert(format!("{field}_max"), max.to_string());
			},
		}
	}

	pub fn set_raw(&mut self, field: &str, value: impl Into<String>) {
		self.params.insert(field.to_string(), value.into());
	}

	pub fn remove(&mut self, field: &str) -> Option<String> {
		self.params.remove(field)
	}

	pub fn get(&self, field: &str) -> Option<&str> {
		self.params.get(field).map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	pub fn as_map(&self) -> &BTreeMap<String, String> {
		&self.params
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	/// Whether any user filter field is present, ignoring `_`-prefixed
	/// bookkeeping keys.
	pub fn has_filter_fields(&self) -> bool {
		self.params.keys().any(|key| !key.starts_with('_'))
	}

	/// Encode a `fields` projection, or request every field.
	pub fn set_projection(&mut self, fields: Option<&[&str]>, all_fields: bool) {
		match fields {
			Some(fields) if !fields.is_empty() => {
				self.params.insert("_fields".to_string(), fields.join(","));
			},
			_ =>
				if all_fields {
					self.params.insert("_all_fields".to_string(), "true".to_string());
				},
		}
	}

	/// Serialized length of `key=<encoded value>&` for every parameter except
	/// `skip`, as the partition planner budgets URL headroom.
	pub fn encoded_len_excluding(&self, skip: &str) -> usize {
		self.params
			.iter()
			.filter(|(key, _)| key.as_str() != skip)
			.map(|(key, value)| key.len() + 1 + encoded_len(value) + 1)
			.sum()
	}
}

pub fn encode_value(value: &str) -> String {
	utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

pub fn encoded_len(value: &str) -> usize {
	utf8_percent_encode(value, QUERY_ENCODE_SET).map(str::len).sum()
}
