pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("REST query returned error status code {status} on URL {url} with message: {message}")]
	Rest { status: u16, url: String, message: String },
	#[error("REST query failed on URL {url}: {message}")]
	Transport { url: String, message: String },
	#[error("REST query timed out on URL {url}. Try again with a smaller request.")]
	RequestTimeout { url: String },
	#[error("{message}")]
	Config { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Parallel request task failed: {message}")]
	Task { message: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	Domain(#[from] mprest_domain::Error),
}
