use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionTrigger, WaitOutcome, js_string, outcome_of};
use crate::error::Result;
use crate::page::PageSession;

/// Waits for a DOM event to fire once.
///
/// The listener is attached to `document`, or to the first element matching
/// `selector`. With a timeout the page-side promise rejects when it elapses,
/// which surfaces as [`WaitOutcome::EvaluationFailed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	event: String,
	selector: Option<String>,
	timeout: Option<Duration>,
}

impl Event {
	pub fn new(event: impl Into<String>) -> Self {
		Self {
			event: event.into(),
			selector: None,
			timeout: None,
		}
	}

	/// Listens on the first element matching `selector` instead of `document`.
	pub fn on_selector(mut self, selector: impl Into<String>) -> Self {
		self.selector = Some(selector.into());
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub(crate) fn script(&self) -> String {
		let event = js_string(&self.event);
		let target = match &self.selector {
			Some(selector) => format!("document.querySelector({})", js_string(selector)),
			None => "document".to_string(),
		};
		let timeout = match self.timeout {
			Some(t) => format!(
				"setTimeout(() => reject(new Error('Timeout waiting for event ' + {event})), {});",
				t.as_millis()
			),
			None => String::new(),
		};
		format!(
			"new Promise((resolve, reject) => {{ \
				const target = {target}; \
				if (!target) {{ reject(new Error('No element to listen on for event ' + {event})); return; }} \
				target.addEventListener({event}, () => resolve(true), {{ once: true }}); \
				{timeout} \
			}})"
		)
	}
}

#[async_trait]
impl CompletionTrigger for Event {
	async fn wait(&self, page: &PageSession) -> Result<WaitOutcome> {
		debug!(target = "htmlpdf.trigger", event = %self.event, selector = ?self.selector, "event trigger");
		let result = page.evaluate(&self.script(), true).await?;
		Ok(outcome_of(&result).unwrap_or(WaitOutcome::Ready))
	}
}
