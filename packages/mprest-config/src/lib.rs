mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Api, Config, Query, Store};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.api.endpoint.trim().is_empty() {
		return Err(Error::Validation { message: "api.endpoint must be non-empty.".to_string() });
	}
	if !cfg.api.endpoint.starts_with("http://") && !cfg.api.endpoint.starts_with("https://") {
		return Err(Error::Validation {
			message: "api.endpoint must be an http or https URL.".to_string(),
		});
	}
	if cfg.api.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "api.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.query.num_parallel_requests == 0 {
		return Err(Error::Validation {
			message: "query.num_parallel_requests must be greater than zero.".to_string(),
		});
	}
	if cfg.query.chunk_size == 0 {
		return Err(Error::Validation {
			message: "query.chunk_size must be greater than zero.".to_string(),
		});
	}

	// A ceiling below one encoded filter value cannot fit any partition.
	if cfg.query.max_url_length < 100 {
		return Err(Error::Validation {
			message: "query.max_url_length must be at least 100.".to_string(),
		});
	}

	if let Some(store) = cfg.store.as_ref() {
		if store.bucket.trim().is_empty() {
			return Err(Error::Validation {
				message: "store.bucket must be non-empty.".to_string(),
			});
		}
		if store.database_version.trim().is_empty() {
			return Err(Error::Validation {
				message: "store.database_version must be non-empty.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if !cfg.api.endpoint.is_empty() && !cfg.api.endpoint.ends_with('/') {
		cfg.api.endpoint.push('/');
	}
	if cfg.api.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.api.api_key = None;
	}
}
