use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionTrigger, WaitOutcome};
use crate::error::Result;
use crate::page::PageSession;

/// Waits a fixed duration, then resolves unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
	delay: Duration,
}

impl Timer {
	pub fn new(delay: Duration) -> Self {
		Self { delay }
	}

	pub fn from_millis(ms: u64) -> Self {
		Self::new(Duration::from_millis(ms))
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}
}

#[async_trait]
impl CompletionTrigger for Timer {
	async fn wait(&self, _page: &PageSession) -> Result<WaitOutcome> {
		debug!(target = "htmlpdf.trigger", delay_ms = self.delay.as_millis() as u64, "timer trigger");
		tokio::time::sleep(self.delay).await;
		Ok(WaitOutcome::Ready)
	}
}
