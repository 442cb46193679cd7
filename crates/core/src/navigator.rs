//! The per-request state machine that drives one page from blank to printed.
//!
//! ```text
//! Idle -> Connecting -> PreNavigate -> Navigating -> PostNavigate -> Printing -> Done
//!   \_________\______________\_____________\______________\____________\-> Failed
//! ```
//!
//! Every transition consults the cancellation envelope first, so no further
//! protocol call is issued once the deadline has elapsed.

use std::fmt;

use htmlpdf_protocol::methods::{PAGE_LOAD_EVENT_FIRED, RUNTIME_CONSOLE_API_CALLED, RUNTIME_EXCEPTION_THROWN};
use htmlpdf_protocol::{ConsoleApiCalled, ExceptionThrown};
use htmlpdf_runtime::EventStream;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::cancel::CancellationEnvelope;
use crate::error::{Error, Result};
use crate::options::CreateOptions;
use crate::page::{PageSession, next_event};
use crate::trigger::WaitOutcome;

/// Where a request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Connecting,
	PreNavigate,
	Navigating,
	PostNavigate,
	Printing,
	Done,
	Failed,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Phase::Idle => "idle",
			Phase::Connecting => "connecting",
			Phase::PreNavigate => "pre-navigate",
			Phase::Navigating => "navigating",
			Phase::PostNavigate => "post-navigate",
			Phase::Printing => "printing",
			Phase::Done => "done",
			Phase::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// Sequences the protocol calls of one request.
pub(crate) struct Navigator<'a> {
	options: &'a CreateOptions,
	envelope: &'a CancellationEnvelope,
	phase: Phase,
}

impl<'a> Navigator<'a> {
	pub(crate) fn new(options: &'a CreateOptions, envelope: &'a CancellationEnvelope) -> Self {
		Self {
			options,
			envelope,
			phase: Phase::Idle,
		}
	}

	pub(crate) fn options(&self) -> &'a CreateOptions {
		self.options
	}

	pub(crate) fn phase(&self) -> Phase {
		self.phase
	}

	/// Moves to `next` unless the request has been canceled.
	pub(crate) fn advance(&mut self, next: Phase) -> Result<()> {
		if let Err(e) = self.envelope.guard() {
			warn!(target = "htmlpdf.navigate", phase = %self.phase, next = %next, "canceled before transition");
			return Err(e);
		}
		debug!(target = "htmlpdf.navigate", from = %self.phase, to = %next, "transition");
		self.phase = next;
		Ok(())
	}

	/// Records a failure at the current phase.
	pub(crate) fn fail(&mut self, error: &Error) {
		warn!(target = "htmlpdf.navigate", phase = %self.phase, error = %error, "generation failed");
		self.phase = Phase::Failed;
	}

	/// Runs PreNavigate through Done on an acquired page, returning the
	/// base64 artifact.
	pub(crate) async fn drive(&mut self, page: &PageSession, url: &str) -> Result<String> {
		self.advance(Phase::PreNavigate)?;
		let _observers = self.prepare(page).await?;

		self.advance(Phase::Navigating)?;
		self.navigate(page, url).await?;

		self.advance(Phase::PostNavigate)?;
		self.await_completion(page).await?;

		self.advance(Phase::Printing)?;
		let data = page.print_to_pdf(&self.options.print_options).await?;

		self.advance(Phase::Done)?;
		Ok(data)
	}

	async fn prepare(&self, page: &PageSession) -> Result<ObserverTasks> {
		page.enable_page().await?;
		self.envelope.guard()?;
		page.enable_runtime().await?;

		if self.options.needs_network() {
			self.envelope.guard()?;
			page.enable_network().await?;
		}

		if self.options.clear_cache {
			self.envelope.guard()?;
			page.clear_browser_cache().await?;
		}

		let observers = self.spawn_observers(page);

		if !self.options.cookies.is_empty() {
			self.envelope.guard()?;
			debug!(target = "htmlpdf.navigate", count = self.options.cookies.len(), "injecting cookies");
			page.set_cookies(&self.options.cookies).await?;
		}

		if !self.options.extra_http_headers.is_empty() {
			self.envelope.guard()?;
			page.set_extra_http_headers(&self.options.extra_http_headers).await?;
		}

		Ok(observers)
	}

	fn spawn_observers(&self, page: &PageSession) -> ObserverTasks {
		let mut tasks = ObserverTasks::default();
		if let Some(observer) = self.options.console_observer.clone() {
			let events = page.subscribe(RUNTIME_CONSOLE_API_CALLED);
			tasks.0.push(forward::<ConsoleApiCalled>(events, move |event| observer(event)));
		}
		if let Some(observer) = self.options.exception_observer.clone() {
			let events = page.subscribe(RUNTIME_EXCEPTION_THROWN);
			tasks.0.push(forward::<ExceptionThrown>(events, move |event| observer(event)));
		}
		tasks
	}

	/// Issues `Page.navigate` and waits for both its response and the load
	/// event, in whichever order they arrive.
	async fn navigate(&self, page: &PageSession, url: &str) -> Result<()> {
		let mut loads = page.subscribe(PAGE_LOAD_EVENT_FIRED);
		let (navigation, _load) = tokio::try_join!(page.navigate(url), next_event(&mut loads))?;
		if let Some(error_text) = navigation.error_text.as_deref() {
			warn!(target = "htmlpdf.navigate", frame = %navigation.frame_id, error = %error_text, "navigation reported an error");
		}
		debug!(target = "htmlpdf.navigate", frame = %navigation.frame_id, "page loaded");
		Ok(())
	}

	async fn await_completion(&self, page: &PageSession) -> Result<()> {
		let Some(trigger) = &self.options.completion_trigger else {
			return Ok(());
		};
		debug!(target = "htmlpdf.trigger", ?trigger, "waiting for completion trigger");
		match trigger.wait(page).await? {
			WaitOutcome::Ready => Ok(()),
			WaitOutcome::EvaluationFailed(message) => Err(Error::Evaluation(message)),
			WaitOutcome::TimedOut(message) => Err(Error::Timeout(message)),
		}
	}
}

/// Observer forwarding tasks, aborted when the request ends.
#[derive(Default)]
struct ObserverTasks(Vec<JoinHandle<()>>);

impl Drop for ObserverTasks {
	fn drop(&mut self) {
		for task in &self.0 {
			task.abort();
		}
	}
}

fn forward<T>(mut events: EventStream, observer: impl Fn(&T) + Send + 'static) -> JoinHandle<()>
where
	T: DeserializeOwned + Send + 'static,
{
	tokio::spawn(async move {
		while let Some(params) = events.recv().await {
			match serde_json::from_value::<T>(params) {
				Ok(event) => observer(&event),
				Err(e) => trace!(target = "htmlpdf.navigate", error = %e, "dropping malformed page event"),
			}
		}
	})
}
