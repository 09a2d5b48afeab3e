use std::{future::Future, sync::Arc};

use serde_json::Value;

use crate::{
	Error, Meta, QueryResult, QuerySettings, Result,
	executor::{BarProgress, DocCount, NoProgress, ParallelExecutor, Progress},
};

/// Bulk object store addressed by key under a collection prefix.
///
/// Only the interface is defined here; production bindings live with the
/// deployment. Payloads are text: one JSON document, a JSON array, or
/// newline-delimited JSON.
pub trait ObjectStore: Send + Sync + 'static {
	/// Whether a store is actually bound. The placeholder reports false.
	fn available(&self) -> bool {
		true
	}

	/// Estimated document total under a prefix, for sizing progress.
	fn count(&self, prefix: &str) -> impl Future<Output = Result<u64>> + Send;

	fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

	fn fetch(&self, key: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Placeholder for resters without a bulk store bound.
pub struct NoStore;
impl ObjectStore for NoStore {
	fn available(&self) -> bool {
		false
	}

	fn count(&self, _: &str) -> impl Future<Output = Result<u64>> + Send {
		async { Err(no_store()) }
	}

	fn list(&self, _: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
		async { Err(no_store()) }
	}

	fn fetch(&self, _: &str) -> impl Future<Output = Result<String>> + Send {
		async { Err(no_store()) }
	}
}

fn no_store() -> Error {
	Error::Config { message: "No object store is configured for this rester.".to_string() }
}

struct ObjectBatch {
	docs: Vec<Value>,
}
impl DocCount for ObjectBatch {
	fn doc_count(&self) -> u64 {
		self.docs.len() as u64
	}
}

/// Retrieve a whole collection from the bulk store instead of paginating the
/// query endpoint. Used for unfiltered, uncapped queries only.
///
/// Documents flagged `deprecated` are dropped; when a projection is given,
/// each document is trimmed to the requested fields.
pub async fn bulk_fetch<S>(
	store: &Arc<S>,
	collection: &str,
	database_version: &str,
	fields: Option<&[&str]>,
	settings: &QuerySettings,
	doc_name: &str,
) -> Result<QueryResult>
where
	S: ObjectStore,
{
	let prefix = format!("{collection}/{database_version}/");
	let estimate = store.count(&prefix).await?;
	let keys = store.list(&prefix).await?;

	tracing::debug!(prefix = %prefix, objects = keys.len(), "Retrieving collection from the object store.");

	let progress: Box<dyn Progress> = if settings.mute_progress {
		Box::new(NoProgress)
	} else {
		Box::new(BarProgress::new(estimate, format!("Retrieving {doc_name} documents")))
	};
	let executor = ParallelExecutor::new(settings.num_parallel_requests);
	let fetch = |key: String| {
		let store = Arc::clone(store);

		async move {
			let payload = store.fetch(&key).await?;
			let docs = decode_payload(&payload)?;
			let subtotal = docs.len() as u64;

			Ok((ObjectBatch { docs }, subtotal))
		}
	};
	let completions = executor.run(&fetch, keys, progress.as_ref()).await?;
	let mut data = Vec::new();

	for done in completions {
		for doc in done.result.docs {
			if doc.get("deprecated").and_then(Value::as_bool).unwrap_or(false) {
				continue;
			}

			data.push(project(doc, fields));
		}
	}

	progress.close();

	let meta =
		Meta { total_doc: Some(data.len() as u64), time_stamp: None, shortfall: None };

	Ok(QueryResult { data, meta })
}

/// Decode one object payload: whole-payload JSON first, then line-delimited.
fn decode_payload(payload: &str) -> Result<Vec<Value>> {
	match serde_json::from_str::<Value>(payload) {
		Ok(Value::Array(docs)) => Ok(docs),
		Ok(doc) => Ok(vec![doc]),
		Err(_) => {
			let mut docs = Vec::new();

			for line in payload.lines() {
				let line = line.trim();

				if line.is_empty() {
					continue;
				}

				docs.push(serde_json::from_str(line)?);
			}

			Ok(docs)
		},
	}
}

fn project(doc: Value, fields: Option<&[&str]>) -> Value {
	let Some(fields) = fields else {
		return doc;
	};
	let Value::Object(mut map) = doc else {
		return doc;
	};

	map.retain(|key, _| fields.contains(&key.as_str()));

	Value::Object(map)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_single_documents_and_arrays() {
		let single = decode_payload(r#"{"material_id": "mp-1"}"#).expect("decode failed");

		assert_eq!(single.len(), 1);

		let array =
			decode_payload(r#"[{"material_id": "mp-1"}, {"material_id": "mp-2"}]"#)
				.expect("decode failed");

		assert_eq!(array.len(), 2);
	}

	#[test]
	fn decodes_line_delimited_payloads() {
		let payload = "{\"material_id\": \"mp-1\"}\n\n{\"material_id\": \"mp-2\"}\n";
		let docs = decode_payload(payload).expect("decode failed");

		assert_eq!(docs.len(), 2);
		assert_eq!(docs[1]["material_id"], "mp-2");
	}

	#[test]
	fn rejects_malformed_lines() {
		assert!(decode_payload("{\"a\": 1}\nnot json\n").is_err());
	}

	#[test]
	fn projection_trims_documents() {
		let doc = serde_json::json!({"material_id": "mp-1", "band_gap": 1.0, "volume": 20.0});
		let trimmed = project(doc, Some(&["material_id", "band_gap"]));

		assert_eq!(
			trimmed,
			serde_json::json!({"material_id": "mp-1", "band_gap": 1.0})
		);
	}
}
