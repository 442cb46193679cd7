//! Polling triggers: evaluate a boolean expression until it holds.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{CompletionTrigger, WaitOutcome, js_string, outcome_of};
use crate::error::Result;
use crate::page::PageSession;

/// Default polling interval (100ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default global polled by [`Variable::default`].
pub const DEFAULT_VARIABLE_NAME: &str = "htmlPdfDone";

/// How often and how long to poll.
///
/// With neither `max_attempts` nor `timeout` set, polling continues until the
/// condition holds or the request deadline cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
	pub interval: Duration,
	pub max_attempts: Option<u32>,
	pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
	fn default() -> Self {
		Self {
			interval: DEFAULT_POLL_INTERVAL,
			max_attempts: None,
			timeout: None,
		}
	}
}

/// Evaluates `expression` once per interval until it is truthy.
///
/// Polls never overlap: the next evaluation is issued only after the
/// previous one returned and the interval elapsed. The first truthy
/// observation wins.
async fn poll_until(page: &PageSession, expression: &str, what: &str, policy: &PollPolicy) -> Result<WaitOutcome> {
	let started = Instant::now();
	let mut attempts: u32 = 0;

	loop {
		attempts += 1;
		let result = page.evaluate(expression, false).await?;
		if let Some(failed) = outcome_of(&result) {
			return Ok(failed);
		}
		if result.result.is_truthy() {
			debug!(target = "htmlpdf.trigger", %what, attempts, "condition satisfied");
			return Ok(WaitOutcome::Ready);
		}
		trace!(target = "htmlpdf.trigger", %what, attempts, "condition not yet satisfied");

		if policy.max_attempts.is_some_and(|max| attempts >= max) {
			return Ok(WaitOutcome::TimedOut(format!("{what} not satisfied after {attempts} attempts")));
		}
		if let Some(timeout) = policy.timeout {
			if started.elapsed() + policy.interval > timeout {
				return Ok(WaitOutcome::TimedOut(format!(
					"{what} not satisfied within {} ms",
					timeout.as_millis()
				)));
			}
		}

		tokio::time::sleep(policy.interval).await;
	}
}

/// Polls a global variable, or an arbitrary expression, for truthiness.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
	expression: String,
	label: String,
	policy: PollPolicy,
}

impl Default for Variable {
	fn default() -> Self {
		Self::new(DEFAULT_VARIABLE_NAME)
	}
}

impl Variable {
	/// Polls `window[name]`.
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			expression: format!("!!window[{}]", js_string(&name)),
			label: format!("variable {name}"),
			policy: PollPolicy::default(),
		}
	}

	/// Polls an arbitrary JavaScript expression.
	pub fn expression(expression: impl Into<String>) -> Self {
		let expression = expression.into();
		Self {
			label: format!("expression {expression}"),
			expression: format!("!!({expression})"),
			policy: PollPolicy::default(),
		}
	}

	pub fn with_policy(mut self, policy: PollPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.policy.interval = interval;
		self
	}

	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.policy.max_attempts = Some(max_attempts);
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.policy.timeout = Some(timeout);
		self
	}

	pub fn script(&self) -> &str {
		&self.expression
	}
}

#[async_trait]
impl CompletionTrigger for Variable {
	async fn wait(&self, page: &PageSession) -> Result<WaitOutcome> {
		poll_until(page, &self.expression, &self.label, &self.policy).await
	}
}

/// Polls for a node matching a CSS selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	selector: String,
	policy: PollPolicy,
}

impl Element {
	pub fn new(selector: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			policy: PollPolicy::default(),
		}
	}

	pub fn with_policy(mut self, policy: PollPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.policy.interval = interval;
		self
	}

	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.policy.max_attempts = Some(max_attempts);
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.policy.timeout = Some(timeout);
		self
	}

	pub fn script(&self) -> String {
		format!("document.querySelector({}) !== null", js_string(&self.selector))
	}
}

#[async_trait]
impl CompletionTrigger for Element {
	async fn wait(&self, page: &PageSession) -> Result<WaitOutcome> {
		let label = format!("selector {}", self.selector);
		poll_until(page, &self.script(), &label, &self.policy).await
	}
}
