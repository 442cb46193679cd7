use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::select_all;

use super::{CompletionTrigger, WaitOutcome};
use crate::error::Result;
use crate::page::PageSession;

/// How a [`Composite`] combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
	/// Children run in order; the first non-ready outcome is returned.
	All,
	/// Children run concurrently; the first ready child wins. A child that
	/// fails to evaluate, or loses its connection, fails the whole composite
	/// at once. When every child times out, the last timeout is returned.
	Any,
}

/// A trigger made of other triggers.
#[derive(Debug, Clone)]
pub struct Composite {
	mode: Combine,
	children: Vec<Arc<dyn CompletionTrigger>>,
}

impl Composite {
	pub fn new(mode: Combine) -> Self {
		Self { mode, children: Vec::new() }
	}

	pub fn all() -> Self {
		Self::new(Combine::All)
	}

	pub fn any() -> Self {
		Self::new(Combine::Any)
	}

	pub fn with(mut self, trigger: impl CompletionTrigger + 'static) -> Self {
		self.children.push(Arc::new(trigger));
		self
	}

	pub fn with_shared(mut self, trigger: Arc<dyn CompletionTrigger>) -> Self {
		self.children.push(trigger);
		self
	}

	pub fn mode(&self) -> Combine {
		self.mode
	}

	pub fn len(&self) -> usize {
		self.children.len()
	}

	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	async fn wait_all(&self, page: &PageSession) -> Result<WaitOutcome> {
		for child in &self.children {
			let outcome = child.wait(page).await?;
			if !outcome.is_ready() {
				return Ok(outcome);
			}
		}
		Ok(WaitOutcome::Ready)
	}

	async fn wait_any(&self, page: &PageSession) -> Result<WaitOutcome> {
		if self.children.is_empty() {
			return Ok(WaitOutcome::Ready);
		}

		let mut pending: Vec<Pin<Box<dyn Future<Output = Result<WaitOutcome>> + Send + '_>>> =
			self.children.iter().map(|child| child.wait(page)).collect();

		loop {
			let (result, _index, remaining) = select_all(pending).await;
			match result {
				Ok(WaitOutcome::TimedOut(_)) if !remaining.is_empty() => pending = remaining,
				other => return other,
			}
		}
	}
}

#[async_trait]
impl CompletionTrigger for Composite {
	async fn wait(&self, page: &PageSession) -> Result<WaitOutcome> {
		match self.mode {
			Combine::All => self.wait_all(page).await,
			Combine::Any => self.wait_any(page).await,
		}
	}
}
