mod error;

pub use error::{Error, Result};

use std::{
	collections::{BTreeMap, HashMap, HashSet},
	future::Future,
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::task::JoinHandle;

use mprest_client::ObjectStore;

/// In-process mock of the query endpoint.
///
/// Serves seeded documents per collection with `_limit`/`_skip` pagination,
/// `_fields` projection, and a handful of filter parameters; unknown filter
/// parameters draw a 400 with a validation-entry `detail` list, unknown
/// collections a 404, mirroring the real service's envelope. Every physical
/// request increments a hit counter so tests can assert round counts.
pub struct TestServer {
	addr: SocketAddr,
	hits: Arc<AtomicUsize>,
	handle: JoinHandle<()>,
}

#[derive(Clone)]
struct ServerState(Arc<ServerInner>);

struct ServerInner {
	collections: HashMap<String, Vec<Value>>,
	hits: Arc<AtomicUsize>,
}

impl TestServer {
	pub async fn spawn(collections: HashMap<String, Vec<Value>>) -> Result<Self> {
		let hits = Arc::new(AtomicUsize::new(0));
		let state = ServerState(Arc::new(ServerInner { collections, hits: Arc::clone(&hits) }));
		let app = Router::new().route("/{*path}", get(query_docs)).with_state(state);
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app).await {
				eprintln!("Test server stopped: {err}.");
			}
		});

		Ok(Self { addr, hits, handle })
	}

	/// Spawn with one collection of seeded documents.
	pub async fn spawn_single(collection: &str, docs: Vec<Value>) -> Result<Self> {
		Self::spawn(HashMap::from([(collection.to_string(), docs)])).await
	}

	pub fn endpoint(&self) -> String {
		format!("http://{}/", self.addr)
	}

	/// Physical requests served so far.
	pub fn hits(&self) -> usize {
		self.hits.load(Ordering::SeqCst)
	}

	pub fn reset_hits(&self) {
		self.hits.store(0, Ordering::SeqCst);
	}
}
impl Drop for TestServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

async fn query_docs(
	State(state): State<ServerState>,
	Path(path): Path<String>,
	Query(params): Query<HashMap<String, String>>,
) -> Response {
	state.0.hits.fetch_add(1, Ordering::SeqCst);

	let mut segments = path.trim_matches('/').split('/');
	let collection = segments.next().unwrap_or_default();
	let id = segments.next().filter(|segment| !segment.is_empty());
	let Some(docs) = state.0.collections.get(collection) else {
		return (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" }))).into_response();
	};
	let mut filtered: Vec<&Value> = docs.iter().collect();

	if let Some(id) = id {
		filtered.retain(|doc| doc.get("material_id").and_then(Value::as_str) == Some(id));
	}

	for (key, value) in &params {
		match key.as_str() {
			"_limit" | "_skip" | "_fields" | "_all_fields" | "_sort_fields" => {},
			"material_ids" => {
				let wanted: HashSet<&str> = value.split(',').collect();

				filtered.retain(|doc| {
					doc.get("material_id")
						.and_then(Value::as_str)
						.map(|id| wanted.contains(id))
						.unwrap_or(false)
				});
			},
			"formula" => {
				filtered.retain(|doc| {
					doc.get("formula_pretty").and_then(Value::as_str) == Some(value.as_str())
				});
			},
			"is_stable" => {
				let wanted = value == "true";

				filtered
					.retain(|doc| doc.get("is_stable").and_then(Value::as_bool) == Some(wanted));
			},
			"band_gap_min" => {
				let Ok(min) = value.parse::<f64>() else {
					return invalid_parameter(key, "value is not a valid float");
				};

				filtered.retain(|doc| {
					doc.get("band_gap").and_then(Value::as_f64).map(|gap| gap >= min).unwrap_or(false)
				});
			},
			"band_gap_max" => {
				let Ok(max) = value.parse::<f64>() else {
					return invalid_parameter(key, "value is not a valid float");
				};

				filtered.retain(|doc| {
					doc.get("band_gap").and_then(Value::as_f64).map(|gap| gap <= max).unwrap_or(false)
				});
			},
			_ => return invalid_parameter(key, "unsupported query parameter"),
		}
	}

	let total_doc = filtered.len();
	let skip = params.get("_skip").and_then(|raw| raw.parse::<usize>().ok()).unwrap_or(0);
	let limit = params.get("_limit").and_then(|raw| raw.parse::<usize>().ok()).unwrap_or(10);
	let fields: Option<Vec<&str>> =
		params.get("_fields").map(|joined| joined.split(',').collect());
	let page: Vec<Value> = filtered
		.into_iter()
		.skip(skip)
		.take(limit)
		.map(|doc| project(doc, fields.as_deref()))
		.collect();
	let time_stamp = OffsetDateTime::now_utc()
		.format(&Rfc3339)
		.unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string());

	Json(json!({
		"data": page,
		"meta": { "total_doc": total_doc, "time_stamp": time_stamp },
	}))
	.into_response()
}

fn invalid_parameter(key: &str, msg: &str) -> Response {
	(
		StatusCode::BAD_REQUEST,
		Json(json!({ "detail": [{ "loc": ["query", key], "msg": msg }] })),
	)
		.into_response()
}

fn project(doc: &Value, fields: Option<&[&str]>) -> Value {
	let Some(fields) = fields else {
		return doc.clone();
	};
	let Some(map) = doc.as_object() else {
		return doc.clone();
	};
	let projected: serde_json::Map<String, Value> = map
		.iter()
		.filter(|(key, _)| fields.contains(&key.as_str()))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();

	Value::Object(projected)
}

/// Seeded summary-like documents `mp-1 .. mp-n`.
pub fn summary_docs(count: usize) -> Vec<Value> {
	(1..=count)
		.map(|n| {
			json!({
				"material_id": format!("mp-{n}"),
				"formula_pretty": if n % 2 == 0 { "SiO2" } else { "Fe2O3" },
				"nsites": n,
				"band_gap": n as f64 / 10.0,
				"is_stable": n % 3 == 0,
				"deprecated": false,
			})
		})
		.collect()
}

/// Config pointed at a test server, with progress muted and modest
/// parallelism.
pub fn test_config(endpoint: &str) -> mprest_config::Config {
	let mut cfg = mprest_config::Config::default();

	cfg.api.endpoint = endpoint.to_string();
	cfg.api.api_key = Some("test-key".to_string());
	cfg.api.timeout_ms = 5_000;
	cfg.query.num_parallel_requests = 4;
	cfg.query.mute_progress = true;

	cfg
}

/// In-memory [`ObjectStore`] over a key to text-payload map.
///
/// `count` estimates one document per non-empty payload line, which matches
/// line-delimited fixtures exactly and single-document payloads trivially.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	objects: BTreeMap<String, String>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: impl Into<String>, payload: impl Into<String>) {
		self.objects.insert(key.into(), payload.into());
	}
}

impl ObjectStore for MemoryStore {
	fn count(&self, prefix: &str) -> impl Future<Output = mprest_client::Result<u64>> + Send {
		let total: u64 = self
			.objects
			.iter()
			.filter(|(key, _)| key.starts_with(prefix))
			.map(|(_, payload)| payload.lines().filter(|line| !line.trim().is_empty()).count() as u64)
			.sum();

		async move { Ok(total) }
	}

	fn list(&self, prefix: &str) -> impl Future<Output = mprest_client::Result<Vec<String>>> + Send {
		let keys: Vec<String> =
			self.objects.keys().filter(|key| key.starts_with(prefix)).cloned().collect();

		async move { Ok(keys) }
	}

	fn fetch(&self, key: &str) -> impl Future<Output = mprest_client::Result<String>> + Send {
		let payload = self.objects.get(key).cloned().ok_or_else(|| {
			mprest_client::Error::InvalidResponse { message: format!("No object at key {key:?}.") }
		});

		async move { payload }
	}
}
