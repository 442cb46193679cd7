//! One remote page target and the protocol calls the pipeline issues on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use htmlpdf_protocol::methods::*;
use htmlpdf_protocol::{CookieParam, EvaluateParams, EvaluateResult, NavigateResult, PrintToPdfParams, PrintToPdfResult};
use htmlpdf_runtime::{Connection, EventStream, TransportParts};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;

/// A page target bound to its own connection.
///
/// Owned by exactly one request; the message loop runs until the session is
/// closed or dropped.
pub struct PageSession {
	connection: Arc<Connection>,
	target_id: Option<String>,
	loop_task: JoinHandle<()>,
}

impl PageSession {
	/// Wraps a connected transport and starts its message loop.
	pub fn new(parts: TransportParts, target_id: Option<String>) -> Self {
		let connection = Arc::new(Connection::new(parts));
		let loop_task = tokio::spawn({
			let conn = Arc::clone(&connection);
			async move { conn.run().await }
		});
		Self {
			connection,
			target_id,
			loop_task,
		}
	}

	pub fn target_id(&self) -> Option<&str> {
		self.target_id.as_deref()
	}

	/// Issues a command and decodes its result.
	pub async fn call<T: DeserializeOwned>(&self, method: &str, params: impl Serialize) -> Result<T> {
		let params = serde_json::to_value(params)?;
		let value = self.connection.send_message(method, params).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn call_unit(&self, method: &str, params: Value) -> Result<()> {
		self.connection.send_message(method, params).await?;
		Ok(())
	}

	/// Starts buffering events for `method`.
	pub fn subscribe(&self, method: &str) -> EventStream {
		self.connection.subscribe(method)
	}

	pub async fn enable_page(&self) -> Result<()> {
		self.call_unit(PAGE_ENABLE, json!({})).await
	}

	pub async fn enable_runtime(&self) -> Result<()> {
		self.call_unit(RUNTIME_ENABLE, json!({})).await
	}

	pub async fn enable_network(&self) -> Result<()> {
		self.call_unit(NETWORK_ENABLE, json!({})).await
	}

	pub async fn clear_browser_cache(&self) -> Result<()> {
		self.call_unit(NETWORK_CLEAR_BROWSER_CACHE, json!({})).await
	}

	pub async fn set_cookies(&self, cookies: &[CookieParam]) -> Result<()> {
		self.call_unit(NETWORK_SET_COOKIES, json!({ "cookies": cookies })).await
	}

	pub async fn set_extra_http_headers(&self, headers: &BTreeMap<String, String>) -> Result<()> {
		self.call_unit(NETWORK_SET_EXTRA_HTTP_HEADERS, json!({ "headers": headers })).await
	}

	pub async fn navigate(&self, url: &str) -> Result<NavigateResult> {
		debug!(target = "htmlpdf.navigate", url = %truncate(url, 120), "navigate");
		self.call(PAGE_NAVIGATE, json!({ "url": url })).await
	}

	/// Evaluates an expression in the page, returning values by value.
	///
	/// Page-side exceptions are reported in the result, not as an error.
	pub async fn evaluate(&self, expression: &str, await_promise: bool) -> Result<EvaluateResult> {
		let mut params = EvaluateParams::new(expression);
		if await_promise {
			params = params.awaiting_promise();
		}
		self.call(RUNTIME_EVALUATE, params).await
	}

	/// Prints the page, returning the base64 payload.
	pub async fn print_to_pdf(&self, params: &PrintToPdfParams) -> Result<String> {
		let result: PrintToPdfResult = self.call(PAGE_PRINT_TO_PDF, params).await?;
		Ok(result.data)
	}

	/// Closes the connection and stops the message loop.
	pub async fn close(self) -> Result<()> {
		let result = self.connection.close().await;
		self.loop_task.abort();
		Ok(result?)
	}
}

impl Drop for PageSession {
	fn drop(&mut self) {
		self.loop_task.abort();
	}
}

/// Waits for the next event on `events`.
///
/// Fails with a transport error when the connection ends first.
pub async fn next_event(events: &mut EventStream) -> Result<Value> {
	events
		.recv()
		.await
		.ok_or_else(|| htmlpdf_runtime::Error::ConnectionClosed.into())
}

fn truncate(s: &str, max: usize) -> &str {
	match s.char_indices().nth(max) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}
