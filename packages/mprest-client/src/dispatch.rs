use std::time::Duration;

use reqwest::{Client, StatusCode, Url, header::HeaderMap};
use serde_json::Value;

use crate::{Criteria, Error, Result, executor::DocCount};

const USER_AGENT: &str = concat!("mprest/", env!("CARGO_PKG_VERSION"));

/// Pagination metadata returned alongside every page.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Meta {
	pub total_doc: Option<u64>,
	pub time_stamp: Option<String>,
	/// Documents the caller asked for beyond what the server holds. Filled in
	/// locally, never sent by the server.
	pub shortfall: Option<u64>,
}

/// One physical response: raw documents plus metadata.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Page {
	pub data: Vec<Value>,
	pub meta: Meta,
}
impl DocCount for Page {
	fn doc_count(&self) -> u64 {
		self.data.len() as u64
	}
}

/// Issues single requests against the query endpoint and maps failures to
/// typed errors. Retry is the transport's concern, never attempted here.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	client: Client,
	timeout: Duration,
}

impl Dispatcher {
	pub fn new(api_key: Option<&str>, timeout: Duration) -> Result<Self> {
		let mut headers = HeaderMap::new();

		if let Some(key) = api_key {
			headers.insert(
				"x-api-key",
				key.parse().map_err(|_| Error::Config {
					message: "API key contains characters not allowed in a header.".to_string(),
				})?,
			);
		}

		let client = Client::builder().default_headers(headers).user_agent(USER_AGENT).build()?;

		Ok(Self { client, timeout })
	}

	pub fn with_timeout(&self, timeout: Duration) -> Self {
		Self { client: self.client.clone(), timeout }
	}

	/// GET one page. Returns the decoded page plus the server-side subtotal
	/// of documents matching the request's filter.
	pub async fn get_page(&self, url: Url, criteria: &Criteria) -> Result<(Page, u64)> {
		let response = self
			.client
			.get(url.clone())
			.query(criteria.as_map())
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|err| classify_send_error(err, &url))?;
		let status = response.status();

		match status {
			StatusCode::OK => {
				let page: Page = response.json().await?;
				let subtotal = page.meta.total_doc.unwrap_or(1);

				Ok((page, subtotal))
			},
			StatusCode::BAD_REQUEST => {
				let body = response.text().await.unwrap_or_default();

				tracing::warn!(
					url = %url,
					detail = %detail_message(&body),
					"Endpoint rejected a parameter combination. Returning no documents for this request."
				);

				Ok((Page::default(), 0))
			},
			_ => {
				let body = response.text().await.unwrap_or_default();

				Err(rest_error(status, &url, &body))
			},
		}
	}

	/// POST to the endpoint, for match-finding operations that take a request
	/// body. Same envelope and error mapping as GET.
	pub async fn post_resource(
		&self,
		url: Url,
		body: &Value,
		params: Option<&Criteria>,
	) -> Result<Page> {
		let mut request = self.client.post(url.clone()).json(body).timeout(self.timeout);

		if let Some(params) = params {
			request = request.query(params.as_map());
		}

		let response = request.send().await.map_err(|err| classify_send_error(err, &url))?;
		let status = response.status();

		if status == StatusCode::OK {
			let page: Page = response.json().await?;

			return Ok(page);
		}

		let body = response.text().await.unwrap_or_default();

		Err(rest_error(status, &url, &body))
	}
}

fn classify_send_error(err: reqwest::Error, url: &Url) -> Error {
	if err.is_timeout() {
		return Error::RequestTimeout { url: url.to_string() };
	}

	Error::Transport { url: url.to_string(), message: err.to_string() }
}

fn rest_error(status: StatusCode, url: &Url, body: &str) -> Error {
	Error::Rest { status: status.as_u16(), url: url.to_string(), message: detail_message(body) }
}

/// Extract the server's `detail` field: either a plain string, or a list of
/// `{loc, msg}` validation entries joined into one line.
fn detail_message(body: &str) -> String {
	let Some(detail) =
		serde_json::from_str::<Value>(body).ok().and_then(|json| json.get("detail").cloned())
	else {
		return format!("Response {body}");
	};

	match detail {
		Value::String(message) => message,
		Value::Array(entries) => {
			let mut parts = Vec::with_capacity(entries.len());

			for entry in &entries {
				let loc = entry.get("loc").and_then(|loc| loc.get(1)).and_then(Value::as_str);
				let msg = entry.get("msg").and_then(Value::as_str);

				match (loc, msg) {
					(Some(loc), Some(msg)) => parts.push(format!("{loc} - {msg}")),
					_ => return Value::Array(entries.clone()).to_string(),
				}
			}

			parts.join(", ")
		},
		other => other.to_string(),
	}
}
