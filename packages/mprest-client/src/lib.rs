mod criteria;
mod dispatch;
mod error;
mod executor;
mod paginate;
mod partition;
mod rebalance;
pub mod routes;
mod store;

pub use criteria::{Criteria, FilterValue};
pub use dispatch::{Dispatcher, Meta, Page};
pub use error::{Error, Result};
pub use executor::{BarProgress, Completed, DocCount, NoProgress, ParallelExecutor, Progress};
pub use paginate::{Paginator, QueryOptions, QueryResult};
pub use routes::{ParamKind, ParamSpec, RouteSpec, encode_request};
pub use store::{NoStore, ObjectStore, bulk_fetch};

use std::{sync::Arc, time::Duration};

use reqwest::Url;
use serde_json::Value;

use mprest_domain::{Document, ProjectedDoc, materialize, validate_ids};

/// Engine settings consumed by the query core, resolved once from config.
#[derive(Debug, Clone)]
pub struct QuerySettings {
	pub num_parallel_requests: usize,
	pub max_url_length: usize,
	pub default_chunk_size: u64,
	pub no_parallel: Vec<String>,
	pub mute_progress: bool,
}

impl QuerySettings {
	pub fn from_config(cfg: &mprest_config::Config) -> Self {
		Self {
			num_parallel_requests: cfg.query.num_parallel_requests,
			max_url_length: cfg.query.max_url_length,
			default_chunk_size: cfg.query.chunk_size,
			no_parallel: cfg.query.no_parallel.clone(),
			mute_progress: cfg.query.mute_progress,
		}
	}
}

/// Client for one API endpoint.
///
/// Construction binds a [`RouteSpec`]; queries then run through the
/// paginated/parallel engine, or through the bulk object store when one is
/// attached and the query has no filters.
pub struct Rester<S = NoStore> {
	dispatcher: Dispatcher,
	endpoint: Url,
	route: RouteSpec,
	settings: Arc<QuerySettings>,
	store: Arc<S>,
	database_version: Option<String>,
}

impl Rester<NoStore> {
	pub fn new(cfg: &mprest_config::Config, route: RouteSpec) -> Result<Self> {
		let settings = QuerySettings::from_config(cfg);
		let timeout = Duration::from_millis(cfg.api.timeout_ms);
		let dispatcher = Dispatcher::new(cfg.api.api_key.as_deref(), timeout)?;
		let endpoint = join_endpoint(&cfg.api.endpoint, route.suffix)?;

		Ok(Self {
			dispatcher,
			endpoint,
			route,
			settings: Arc::new(settings),
			store: Arc::new(NoStore),
			database_version: cfg.store.as_ref().map(|store| store.database_version.clone()),
		})
	}
}

impl<S> Rester<S>
where
	S: ObjectStore,
{
	/// Attach a bulk object store for unfiltered collection downloads.
	pub fn with_store<S2>(self, store: S2, database_version: impl Into<String>) -> Rester<S2>
	where
		S2: ObjectStore,
	{
		Rester {
			dispatcher: self.dispatcher,
			endpoint: self.endpoint,
			route: self.route,
			settings: self.settings,
			store: Arc::new(store),
			database_version: Some(database_version.into()),
		}
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	pub fn route(&self) -> &RouteSpec {
		&self.route
	}

	/// Run one logical query and return the merged raw pages.
	pub async fn query(
		&self,
		criteria: Criteria,
		fields: Option<&[&str]>,
		options: &QueryOptions,
	) -> Result<QueryResult> {
		self.query_suburl(None, criteria, fields, options).await
	}

	/// Typed search: translate logical arguments through the route's
	/// parameter records, query, then bind the results to `T`.
	pub async fn search<T>(
		&self,
		args: &[(&str, FilterValue)],
		fields: Option<&[&str]>,
		options: &QueryOptions,
	) -> Result<Vec<ProjectedDoc<T>>>
	where
		T: Document,
	{
		let criteria = routes::encode_request(&self.route, args)?;
		let id_field = format!("{}s", self.route.primary_key);

		if let Some(joined) = criteria.get(&id_field) {
			let ids: Vec<String> = joined.split(',').map(str::to_string).collect();

			validate_ids(&ids)?;
		}

		let result = self.query(criteria, fields, options).await?;

		Ok(materialize::<T>(&result.data)?)
	}

	/// Fetch a single document by its primary key.
	pub async fn get_data_by_id<T>(
		&self,
		document_id: &str,
		fields: Option<&[&str]>,
	) -> Result<ProjectedDoc<T>>
	where
		T: Document,
	{
		if matches!(self.route.primary_key, "material_id" | "task_id") {
			validate_ids(&[document_id.to_string()])?;
		}

		let options = QueryOptions {
			chunk_size: Some(1),
			num_chunks: Some(1),
			all_fields: fields.is_none(),
			timeout: None,
		};
		let result =
			self.query_suburl(Some(document_id), Criteria::new(), fields, &options).await?;
		let mut docs = materialize::<T>(&result.data)?;

		match docs.len() {
			0 => Err(Error::InvalidResponse {
				message: format!("No result for record {document_id}."),
			}),
			1 => Ok(docs.remove(0)),
			_ => Err(Error::InvalidResponse {
				message: format!(
					"Multiple results for record {document_id}. This should not happen; please report it."
				),
			}),
		}
	}

	/// Total documents matching the criteria, from a single one-document page.
	pub async fn count(&self, criteria: Criteria) -> Result<u64> {
		let options = QueryOptions {
			chunk_size: Some(1),
			num_chunks: Some(1),
			all_fields: false,
			timeout: None,
		};
		let result = self.query(criteria, None, &options).await?;

		Ok(result.meta.total_doc.unwrap_or(0))
	}

	/// POST a body to the endpoint, for match-finding operations.
	pub async fn post_resource(&self, body: &Value, suburl: Option<&str>) -> Result<Page> {
		let url = self.resolve_url(suburl)?;

		self.dispatcher.post_resource(url, body, None).await
	}

	async fn query_suburl(
		&self,
		suburl: Option<&str>,
		mut criteria: Criteria,
		fields: Option<&[&str]>,
		options: &QueryOptions,
	) -> Result<QueryResult> {
		criteria.set_projection(fields, options.all_fields);

		// A filterless, uncapped query is a whole-collection download; take
		// the bulk path when a store is bound.
		if suburl.is_none()
			&& !criteria.has_filter_fields()
			&& options.num_chunks.is_none()
			&& self.store.available()
		{
			let Some(version) = self.database_version.as_deref() else {
				return Err(Error::Config {
					message: "store.database_version must be configured for bulk retrieval."
						.to_string(),
				});
			};

			return store::bulk_fetch(
				&self.store,
				self.route.suffix,
				version,
				fields,
				&self.settings,
				self.route.name,
			)
			.await;
		}

		let url = self.resolve_url(suburl)?;
		let dispatcher = match options.timeout {
			Some(timeout) => self.dispatcher.with_timeout(timeout),
			None => self.dispatcher.clone(),
		};
		let paginator = Paginator { dispatcher: &dispatcher, settings: self.settings.as_ref() };
		let chunk_size = options.chunk_size.unwrap_or(self.settings.default_chunk_size);

		paginator.paginate(&url, criteria, chunk_size, options.num_chunks, self.route.name).await
	}

	fn resolve_url(&self, suburl: Option<&str>) -> Result<Url> {
		match suburl {
			Some(suburl) => {
				self.endpoint.join(&format!("{suburl}/")).map_err(|err| Error::Config {
					message: format!("Invalid sub-URL {suburl:?}: {err}."),
				})
			},
			None => Ok(self.endpoint.clone()),
		}
	}
}

fn join_endpoint(base: &str, suffix: &str) -> Result<Url> {
	let mut base = base.to_string();

	if !base.ends_with('/') {
		base.push('/');
	}

	let url = Url::parse(&base)
		.map_err(|err| Error::Config { message: format!("Invalid endpoint URL {base:?}: {err}.") })?;

	url.join(&format!("{suffix}/"))
		.map_err(|err| Error::Config { message: format!("Invalid route suffix {suffix:?}: {err}.") })
}
