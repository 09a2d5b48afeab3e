use serde_json::{Map, Value};

use crate::{Document, Error, Result};

/// A schema-validated document restricted to the fields a query projected.
///
/// Typed access goes through [`ProjectedDoc::doc`]; dynamic access through
/// [`ProjectedDoc::field`], which refuses fields the caller chose not to
/// fetch instead of silently yielding nothing.
#[derive(Debug, Clone)]
pub struct ProjectedDoc<T> {
	doc: T,
	raw: Map<String, Value>,
	set_fields: Vec<&'static str>,
	fields_not_requested: Vec<&'static str>,
}

impl<T> ProjectedDoc<T>
where
	T: Document,
{
	pub fn materialize(raw: &Value) -> Result<Self> {
		let map = raw
			.as_object()
			.ok_or_else(|| Error::Validation {
				message: "Document payload must be a JSON object.".to_string(),
			})?
			.clone();
		let doc: T = serde_json::from_value(raw.clone())?;
		let set_fields: Vec<&'static str> =
			T::FIELDS.iter().copied().filter(|field| map.contains_key(*field)).collect();
		let fields_not_requested: Vec<&'static str> =
			T::FIELDS.iter().copied().filter(|field| !map.contains_key(*field)).collect();

		Ok(Self { doc, raw: map, set_fields, fields_not_requested })
	}

	pub fn doc(&self) -> &T {
		&self.doc
	}

	pub fn into_doc(self) -> T {
		self.doc
	}

	pub fn field(&self, name: &str) -> Result<&Value> {
		if self.set_fields.iter().any(|field| *field == name)
			&& let Some(value) = self.raw.get(name)
		{
			return Ok(value);
		}

		if self.fields_not_requested.iter().any(|field| *field == name) {
			return Err(Error::FieldNotRequested { field: name.to_string() });
		}

		Err(Error::UnknownField { field: name.to_string() })
	}

	pub fn set_fields(&self) -> &[&'static str] {
		&self.set_fields
	}

	pub fn fields_not_requested(&self) -> &[&'static str] {
		&self.fields_not_requested
	}
}

/// Bind a page of raw documents to `T`, tracking the projected field set of
/// each one. Field sets are computed per call and never shared.
pub fn materialize<T>(raw_docs: &[Value]) -> Result<Vec<ProjectedDoc<T>>>
where
	T: Document,
{
	raw_docs.iter().map(ProjectedDoc::materialize).collect()
}
