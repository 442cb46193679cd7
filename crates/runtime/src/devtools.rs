//! DevTools HTTP endpoint helpers.
//!
//! An engine started with `--remote-debugging-port` serves a small HTTP API
//! next to its WebSocket endpoints: `/json/version` for discovery,
//! `/json/new` to open a page target and `/json/close/{id}` to dispose of it.

use std::time::Duration;

use htmlpdf_protocol::{TargetDescriptor, VersionInfo};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Host and port of a remote engine's debugging endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
}

impl Endpoint {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self { host: host.into(), port }
	}

	pub fn local(port: u16) -> Self {
		Self::new("127.0.0.1", port)
	}

	/// Base HTTP URL, bracketing IPv6 literals.
	pub fn http_base(&self) -> String {
		if self.host.contains(':') && !self.host.starts_with('[') {
			format!("http://[{}]:{}", self.host, self.port)
		} else {
			format!("http://{}:{}", self.host, self.port)
		}
	}
}

impl std::fmt::Display for Endpoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}

/// Thin client for the DevTools HTTP API of one endpoint.
#[derive(Debug, Clone)]
pub struct DevToolsHttp {
	client: reqwest::Client,
	endpoint: Endpoint,
}

impl DevToolsHttp {
	pub fn new(endpoint: Endpoint) -> Result<Self> {
		Self::with_timeout(endpoint, Duration::from_secs(5))
	}

	pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| Error::Http(format!("failed to create HTTP client: {}", e)))?;
		Ok(Self { client, endpoint })
	}

	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	/// Resolves `/json/version` metadata.
	pub async fn version(&self) -> Result<VersionInfo> {
		let url = format!("{}/json/version", self.endpoint.http_base());
		self.fetch_json(self.client.get(&url), &url).await
	}

	/// Opens a new page target navigated to `about:blank`.
	pub async fn new_page(&self) -> Result<TargetDescriptor> {
		let url = format!("{}/json/new?about:blank", self.endpoint.http_base());
		let target: TargetDescriptor = self.fetch_json(self.client.put(&url), &url).await?;
		debug!(target = "htmlpdf.runtime", id = %target.id, endpoint = %self.endpoint, "page target created");
		Ok(target)
	}

	/// Closes a page target by id.
	pub async fn close_page(&self, id: &str) -> Result<()> {
		let url = format!("{}/json/close/{}", self.endpoint.http_base(), id);
		let response = self
			.client
			.put(&url)
			.send()
			.await
			.map_err(|e| Error::Http(format!("{}: {}", url, e)))?;
		if !response.status().is_success() {
			return Err(Error::Http(format!("{}: unexpected status {}", url, response.status())));
		}
		Ok(())
	}

	async fn fetch_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &str) -> Result<T> {
		let response = request.send().await.map_err(|e| Error::Http(format!("{}: {}", url, e)))?;
		if !response.status().is_success() {
			return Err(Error::Http(format!("{}: unexpected status {}", url, response.status())));
		}
		response
			.json()
			.await
			.map_err(|e| Error::Http(format!("failed to parse response from {}: {}", url, e)))
	}
}

/// WebSocket URL of a page target, falling back to the conventional path when
/// the engine omits it.
pub fn page_websocket_url(endpoint: &Endpoint, target: &TargetDescriptor) -> String {
	match &target.web_socket_debugger_url {
		Some(url) => url.clone(),
		None => format!(
			"ws://{}/devtools/page/{}",
			endpoint.http_base().trim_start_matches("http://"),
			target.id
		),
	}
}
