//! Cooperative cancellation for one generation request.
//!
//! DevTools calls have no cancellation primitive, so the envelope is a shared
//! flag consulted at step boundaries. An optional one-shot timer flips the
//! flag when the request deadline elapses. Calls already in flight are not
//! aborted; [`CancellationEnvelope::guard`] only stops the next one from being
//! issued, and [`CancellationEnvelope::race`] makes the overall request settle
//! promptly instead of waiting for a step that never completes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

pub struct CancellationEnvelope {
	flag: Arc<watch::Sender<bool>>,
	timeout: Option<Duration>,
	started: Instant,
	timer: Option<JoinHandle<()>>,
}

impl CancellationEnvelope {
	/// Arms the envelope. A missing or zero timeout arms no timer, and the
	/// guard then never fails because of time.
	///
	/// Must be called inside a tokio runtime when a timeout is given.
	pub fn new(timeout: Option<Duration>) -> Self {
		let timeout = timeout.filter(|t| !t.is_zero());
		let (tx, _rx) = watch::channel(false);
		let flag = Arc::new(tx);

		let timer = timeout.map(|duration| {
			let flag = Arc::clone(&flag);
			tokio::spawn(async move {
				tokio::time::sleep(duration).await;
				if flip(&flag) {
					debug!(target = "htmlpdf.navigate", timeout_ms = duration.as_millis() as u64, "deadline elapsed");
				}
			})
		});

		Self {
			flag,
			timeout,
			started: Instant::now(),
			timer,
		}
	}

	/// An envelope that is never canceled by time.
	pub fn disarmed() -> Self {
		Self::new(None)
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	pub fn is_canceled(&self) -> bool {
		*self.flag.borrow()
	}

	/// Cancels the request; later calls are no-ops.
	pub fn cancel(&self) {
		flip(&self.flag);
	}

	/// Fails with [`Error::Timeout`] once the envelope is canceled.
	pub fn guard(&self) -> Result<()> {
		if self.is_canceled() { Err(self.timeout_error()) } else { Ok(()) }
	}

	/// Resolves when the envelope is canceled; pends forever otherwise.
	pub async fn cancelled(&self) {
		let mut rx = self.flag.subscribe();
		if rx.wait_for(|canceled| *canceled).await.is_err() {
			std::future::pending::<()>().await;
		}
	}

	/// Runs `fut` unless the envelope is canceled first, in which case `fut` is
	/// dropped and the result is a timeout.
	pub async fn race<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
		self.guard()?;
		tokio::select! {
			biased;
			_ = self.cancelled() => Err(self.timeout_error()),
			result = fut => result,
		}
	}

	fn timeout_error(&self) -> Error {
		match self.timeout {
			Some(t) => Error::Timeout(format!(
				"generation exceeded {} ms (canceled after {} ms)",
				t.as_millis(),
				self.started.elapsed().as_millis()
			)),
			None => Error::Timeout("generation canceled".into()),
		}
	}
}

impl Drop for CancellationEnvelope {
	fn drop(&mut self) {
		if let Some(timer) = self.timer.take() {
			timer.abort();
		}
	}
}

/// Sets the flag, returning `true` only for the call that flipped it.
fn flip(flag: &watch::Sender<bool>) -> bool {
	flag.send_if_modified(|canceled| {
		if *canceled {
			false
		} else {
			*canceled = true;
			true
		}
	})
}
