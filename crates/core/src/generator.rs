//! The `create` entry point.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::cancel::CancellationEnvelope;
use crate::content::navigation_url;
use crate::error::Result;
use crate::lifecycle::{Connector, Launcher, ScopedLease, SessionManager};
use crate::navigator::{Navigator, Phase};
use crate::options::CreateOptions;
use crate::result::CreateResult;

/// Runs generation requests against a connector/launcher pair.
///
/// Requests are independent: each one acquires its own session and, when no
/// remote engine is configured, its own engine process.
#[derive(Clone, Default)]
pub struct Generator {
	sessions: SessionManager,
}

impl Generator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Uses custom backends instead of the DevTools connector and Chrome
	/// launcher.
	pub fn with_backends(connector: Arc<dyn Connector>, launcher: Arc<dyn Launcher>) -> Self {
		Self {
			sessions: SessionManager::new(connector, launcher),
		}
	}

	/// Renders `content`, a URL or raw HTML, to PDF.
	///
	/// Fails with a timeout once `options.timeout` elapses, including while
	/// the engine is still launching. The session and any engine launched for
	/// this call are released before it returns, or in the background if the
	/// returned future is dropped first.
	pub async fn create(&self, content: &str, options: &CreateOptions) -> Result<CreateResult> {
		let started = Instant::now();
		let envelope = CancellationEnvelope::new(options.timeout);
		let url = navigation_url(content);
		let mut navigator = Navigator::new(options, &envelope);

		let result = self.run(&mut navigator, &envelope, &url).await;
		match &result {
			Ok(artifact) => info!(
				target = "htmlpdf.navigate",
				bytes = artifact.len(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				"generated"
			),
			Err(e) => navigator.fail(e),
		}
		result
	}

	async fn run(&self, navigator: &mut Navigator<'_>, envelope: &CancellationEnvelope, url: &str) -> Result<CreateResult> {
		navigator.advance(Phase::Connecting)?;
		let lease = envelope.race(self.sessions.acquire(navigator.options())).await?;
		let lease = ScopedLease::new(self.sessions.clone(), lease);

		let outcome = match envelope.guard() {
			Ok(()) => match lease.session() {
				Ok(session) => envelope.race(navigator.drive(session, url)).await,
				Err(e) => Err(e),
			},
			Err(e) => Err(e),
		};

		debug!(target = "htmlpdf.session", phase = %navigator.phase(), "releasing session");
		lease.release().await;
		outcome.map(CreateResult::from_base64)
	}
}

/// Renders `content` with the default DevTools backends.
///
/// See [`Generator::create`].
pub async fn create(content: &str, options: &CreateOptions) -> Result<CreateResult> {
	Generator::new().create(content, options).await
}
