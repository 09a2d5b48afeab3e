use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub api: Api,
	pub query: Query,
	pub store: Option<Store>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Api {
	pub endpoint: String,
	pub api_key: Option<String>,
	pub timeout_ms: u64,
}
impl Default for Api {
	fn default() -> Self {
		Self {
			endpoint: "https://api.materialsproject.org/".to_string(),
			api_key: None,
			timeout_ms: 20_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Query {
	/// Upper bound on concurrently in-flight requests.
	pub num_parallel_requests: usize,
	/// Character ceiling for a serialized request URL.
	pub max_url_length: usize,
	pub chunk_size: u64,
	/// Filter fields that must never be split across parallel sub-queries.
	pub no_parallel: Vec<String>,
	pub mute_progress: bool,
}
impl Default for Query {
	fn default() -> Self {
		Self {
			num_parallel_requests: 8,
			max_url_length: 2_000,
			chunk_size: 1_000,
			no_parallel: default_no_parallel(),
			mute_progress: false,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
	pub bucket: String,
	pub database_version: String,
}

fn default_no_parallel() -> Vec<String> {
	[
		"elements",
		"exclude_elements",
		"possible_species",
		"coordination_envs",
		"has_props",
		"gb_plane",
		"rotation_axis",
		"keywords",
		"operations",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}
