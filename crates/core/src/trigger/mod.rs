//! Completion triggers: caller-defined "page is ready to print" conditions.
//!
//! A trigger is a stateless policy object. It is consulted once per request,
//! after the page has loaded and before it is printed, and may be shared
//! across requests.
//!
//! | Trigger | Ready when |
//! |---|---|
//! | [`Timer`] | a fixed delay has elapsed |
//! | [`Event`] | a DOM event fires on the document or a selected element |
//! | [`Callback`] | the page calls a function installed on `window` |
//! | [`Variable`] | a global variable or expression becomes truthy (polled) |
//! | [`Element`] | a selector matches a node (polled) |
//! | [`Composite`] | all, or any, of its children are ready |

mod callback;
mod composite;
mod event;
mod poll;
mod timer;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::page::PageSession;

pub use callback::Callback;
pub use composite::{Combine, Composite};
pub use event::Event;
pub use poll::{Element, PollPolicy, Variable};
pub use timer::Timer;

/// What a trigger concluded about the page.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
	/// Proceed to print.
	Ready,
	/// Page-side script threw; carries the exception message.
	EvaluationFailed(String),
	/// The trigger gave up waiting.
	TimedOut(String),
}

impl WaitOutcome {
	pub fn is_ready(&self) -> bool {
		matches!(self, WaitOutcome::Ready)
	}
}

/// Strategy deciding when a navigated page is stable enough to print.
///
/// Transport failures are returned as `Err`; page-level verdicts are
/// returned as a [`WaitOutcome`].
#[async_trait]
pub trait CompletionTrigger: Send + Sync + fmt::Debug {
	async fn wait(&self, page: &PageSession) -> Result<WaitOutcome>;
}

/// Encodes `s` as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
	serde_json::Value::String(s.to_string()).to_string()
}

/// Converts an evaluation result into an outcome, mapping page exceptions
/// to [`WaitOutcome::EvaluationFailed`].
pub(crate) fn outcome_of(result: &htmlpdf_protocol::EvaluateResult) -> Option<WaitOutcome> {
	result
		.exception_details
		.as_ref()
		.map(|details| WaitOutcome::EvaluationFailed(details.message()))
}
