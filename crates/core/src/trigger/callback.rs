use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionTrigger, WaitOutcome, js_string, outcome_of};
use crate::error::Result;
use crate::page::PageSession;

/// Default global the page calls to signal readiness.
pub const DEFAULT_CALLBACK_NAME: &str = "htmlPdfCb";

/// Installs a one-time `window[name]` function and waits for the page to call it.
///
/// Any argument passed by the page is logged and otherwise ignored. The
/// function only exists after the load event, so pages must call it from
/// work scheduled after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Callback {
	name: String,
	timeout: Option<Duration>,
}

impl Default for Callback {
	fn default() -> Self {
		Self::new(DEFAULT_CALLBACK_NAME)
	}
}

impl Callback {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			timeout: None,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn script(&self) -> String {
		let name = js_string(&self.name);
		let timeout = match self.timeout {
			Some(t) => format!(
				"setTimeout(() => {{ delete window[{name}]; reject(new Error('Timeout waiting for callback ' + {name})); }}, {});",
				t.as_millis()
			),
			None => String::new(),
		};
		format!(
			"new Promise((resolve, reject) => {{ \
				window[{name}] = (value) => {{ delete window[{name}]; resolve(value === undefined ? null : value); }}; \
				{timeout} \
			}})"
		)
	}
}

#[async_trait]
impl CompletionTrigger for Callback {
	async fn wait(&self, page: &PageSession) -> Result<WaitOutcome> {
		debug!(target = "htmlpdf.trigger", name = %self.name, "callback trigger");
		let result = page.evaluate(&self.script(), true).await?;
		if let Some(failed) = outcome_of(&result) {
			return Ok(failed);
		}
		debug!(target = "htmlpdf.trigger", name = %self.name, value = ?result.result.value, "callback invoked");
		Ok(WaitOutcome::Ready)
	}
}
