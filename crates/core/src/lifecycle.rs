//! Session acquisition and guaranteed release.
//!
//! A [`Lease`] bundles everything one request acquired: the page session,
//! the endpoint it lives on and, when this request started the engine
//! itself, the engine process. [`SessionManager::release`] tears all of it
//! down, session first and process last, and never fails. A [`ScopedLease`]
//! still releases when the request future is dropped mid-flight.

use std::sync::Arc;

use async_trait::async_trait;
use htmlpdf_runtime::{DevToolsHttp, EngineProcess, Endpoint, LaunchOptions, WebSocketTransport, devtools};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::options::CreateOptions;
use crate::page::PageSession;

/// Opens and closes page sessions on a debugging endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
	async fn open(&self, endpoint: &Endpoint) -> Result<PageSession>;

	async fn close(&self, endpoint: &Endpoint, session: PageSession) -> Result<()>;
}

/// Starts local engine processes.
#[async_trait]
pub trait Launcher: Send + Sync {
	async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn EngineHandle>>;
}

/// A launched engine owned by one request.
pub trait EngineHandle: Send + Sync {
	/// Port the debugging endpoint is bound to.
	fn port(&self) -> u16;

	fn kill(&mut self) -> Result<()>;
}

impl EngineHandle for EngineProcess {
	fn port(&self) -> u16 {
		EngineProcess::port(self)
	}

	fn kill(&mut self) -> Result<()> {
		Ok(EngineProcess::kill(self)?)
	}
}

/// Opens a fresh page target over the DevTools HTTP API and connects to its
/// WebSocket.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevToolsConnector;

#[async_trait]
impl Connector for DevToolsConnector {
	async fn open(&self, endpoint: &Endpoint) -> Result<PageSession> {
		let http = DevToolsHttp::new(endpoint.clone())?;
		let target = http.new_page().await?;
		let mut orphan = OrphanTarget::new(http, target.id.clone());
		let url = devtools::page_websocket_url(endpoint, &target);
		debug!(target = "htmlpdf.session", id = %target.id, %url, "connecting to page target");

		let (transport, message_rx) = match WebSocketTransport::connect(&url).await {
			Ok(connected) => connected,
			Err(e) => {
				orphan.close().await;
				return Err(e.into());
			}
		};
		orphan.disarm();
		Ok(PageSession::new(transport.into_transport_parts(message_rx), Some(target.id)))
	}

	async fn close(&self, endpoint: &Endpoint, session: PageSession) -> Result<()> {
		let target_id = session.target_id().map(str::to_string);
		let closed = session.close().await;
		if let Some(id) = target_id {
			DevToolsHttp::new(endpoint.clone())?.close_page(&id).await?;
		}
		closed
	}
}

/// A freshly created page target that no session owns yet.
///
/// Closed on drop unless disarmed, so an abandoned `open` does not leak
/// the target on a shared engine.
struct OrphanTarget {
	http: DevToolsHttp,
	id: Option<String>,
}

impl OrphanTarget {
	fn new(http: DevToolsHttp, id: String) -> Self {
		Self { http, id: Some(id) }
	}

	fn disarm(&mut self) {
		self.id = None;
	}

	async fn close(&mut self) {
		if let Some(id) = self.id.take() {
			if let Err(e) = self.http.close_page(&id).await {
				warn!(target = "htmlpdf.session", %id, error = %e, "failed to close orphaned target");
			}
		}
	}
}

impl Drop for OrphanTarget {
	fn drop(&mut self) {
		let Some(id) = self.id.take() else {
			return;
		};
		let http = self.http.clone();
		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				handle.spawn(async move {
					if let Err(e) = http.close_page(&id).await {
						warn!(target = "htmlpdf.session", %id, error = %e, "failed to close orphaned target");
					}
				});
			}
			Err(_) => warn!(target = "htmlpdf.session", %id, "no runtime to close orphaned target"),
		}
	}
}

/// Launches Chrome/Chromium with [`htmlpdf_runtime::launch`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeLauncher;

#[async_trait]
impl Launcher for ChromeLauncher {
	async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn EngineHandle>> {
		let process = htmlpdf_runtime::launch(options).await?;
		Ok(Box::new(process))
	}
}

/// Everything one request acquired.
pub struct Lease {
	pub session: PageSession,
	pub endpoint: Endpoint,
	/// Present only when this request launched the engine.
	pub process: Option<Box<dyn EngineHandle>>,
}

impl Lease {
	pub fn launched(&self) -> bool {
		self.process.is_some()
	}
}

/// Acquires sessions for requests and releases them on every exit path.
#[derive(Clone)]
pub struct SessionManager {
	connector: Arc<dyn Connector>,
	launcher: Arc<dyn Launcher>,
}

impl Default for SessionManager {
	fn default() -> Self {
		Self::new(Arc::new(DevToolsConnector), Arc::new(ChromeLauncher))
	}
}

impl SessionManager {
	pub fn new(connector: Arc<dyn Connector>, launcher: Arc<dyn Launcher>) -> Self {
		Self { connector, launcher }
	}

	/// Attaches to `options.remote`, or launches an engine and attaches to it.
	///
	/// A launched engine is killed before returning if the session cannot be
	/// opened.
	pub async fn acquire(&self, options: &CreateOptions) -> Result<Lease> {
		let (endpoint, mut process) = match &options.remote {
			Some(remote) => {
				debug!(target = "htmlpdf.session", endpoint = %remote, "attaching to remote engine");
				(remote.clone(), None)
			}
			None => {
				let process = self.launcher.launch(&options.launch).await?;
				let endpoint = Endpoint::local(process.port());
				info!(target = "htmlpdf.session", %endpoint, "engine launched for request");
				(endpoint, Some(process))
			}
		};

		match self.connector.open(&endpoint).await {
			Ok(session) => Ok(Lease {
				session,
				endpoint,
				process,
			}),
			Err(e) => {
				if let Some(process) = process.take() {
					reap(process).await;
				}
				Err(e)
			}
		}
	}

	/// Closes the session, then kills the engine if this request launched it.
	///
	/// Failures are logged; they must not mask the request's own outcome.
	pub async fn release(&self, lease: Lease) {
		let Lease {
			session,
			endpoint,
			process,
		} = lease;

		if let Err(e) = self.connector.close(&endpoint, session).await {
			warn!(target = "htmlpdf.session", %endpoint, error = %e, "failed to close session");
		}
		if let Some(process) = process {
			reap(process).await;
		}
		debug!(target = "htmlpdf.session", %endpoint, "session released");
	}
}

/// A [`Lease`] that is released even if its owner is dropped.
///
/// Call [`ScopedLease::release`] on the normal path. Dropping a lease that
/// was not released hands it to a background task on the current runtime.
pub struct ScopedLease {
	manager: SessionManager,
	lease: Option<Lease>,
}

impl ScopedLease {
	pub fn new(manager: SessionManager, lease: Lease) -> Self {
		Self {
			manager,
			lease: Some(lease),
		}
	}

	/// The leased session, or `ConnectionClosed` once released.
	pub fn session(&self) -> Result<&PageSession> {
		match &self.lease {
			Some(lease) => Ok(&lease.session),
			None => Err(htmlpdf_runtime::Error::ConnectionClosed.into()),
		}
	}

	pub async fn release(mut self) {
		if let Some(lease) = self.lease.take() {
			self.manager.release(lease).await;
		}
	}
}

impl Drop for ScopedLease {
	fn drop(&mut self) {
		let Some(lease) = self.lease.take() else {
			return;
		};
		debug!(target = "htmlpdf.session", endpoint = %lease.endpoint, "request abandoned, releasing in background");
		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let manager = self.manager.clone();
				handle.spawn(async move { manager.release(lease).await });
			}
			Err(_) => warn!(
				target = "htmlpdf.session",
				endpoint = %lease.endpoint,
				"no runtime to release abandoned session"
			),
		}
	}
}

/// Kills a launched engine off the async workers.
async fn reap(mut process: Box<dyn EngineHandle>) {
	let port = process.port();
	match tokio::task::spawn_blocking(move || process.kill()).await {
		Ok(Ok(())) => {}
		Ok(Err(e)) => warn!(target = "htmlpdf.session", port, error = %e, "failed to kill engine"),
		Err(e) => warn!(target = "htmlpdf.session", port, error = %e, "engine kill task failed"),
	}
}
