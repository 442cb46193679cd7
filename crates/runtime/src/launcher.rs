//! Local engine process launch.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::browser_finder::find_engine_executable;
use crate::devtools::{DevToolsHttp, Endpoint};
use crate::error::{Error, Result};
use crate::process::{port_available, resolve_port};

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const REAP_ATTEMPTS: u32 = 50;
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// How to start a local engine.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	/// Explicit executable; discovered when `None`.
	pub executable: Option<PathBuf>,
	/// Debugging port hint; `None` or `0` picks a free port.
	pub port: Option<u16>,
	/// Extra command-line flags appended after the defaults.
	pub flags: Vec<String>,
	pub headless: bool,
	/// How long to wait for the debugging endpoint to answer.
	pub startup_timeout: Duration,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			executable: None,
			port: None,
			flags: Vec::new(),
			headless: true,
			startup_timeout: DEFAULT_STARTUP_TIMEOUT,
		}
	}
}

impl LaunchOptions {
	fn command_line(&self, port: u16, profile: Option<&TempDir>) -> Vec<String> {
		let mut args = vec![
			format!("--remote-debugging-port={}", port),
			"--no-first-run".to_string(),
			"--no-default-browser-check".to_string(),
			"--disable-gpu".to_string(),
			"--hide-scrollbars".to_string(),
		];
		if self.headless {
			args.push("--headless=new".to_string());
		}
		if let Some(dir) = profile {
			args.push(format!("--user-data-dir={}", dir.path().display()));
		}
		args.extend(self.flags.iter().cloned());
		args
	}

	fn wants_own_profile(&self) -> bool {
		!self.flags.iter().any(|f| f.starts_with("--user-data-dir"))
	}
}

/// A running engine started by [`launch`].
///
/// Killing is idempotent; dropping an unkilled process kills it.
pub struct EngineProcess {
	child: Child,
	port: u16,
	killed: bool,
	_profile: Option<TempDir>,
}

impl EngineProcess {
	/// Debugging port the engine listens on.
	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn pid(&self) -> u32 {
		self.child.id()
	}

	/// Terminates the process and reaps it if it exits promptly.
	///
	/// Never waits longer than `REAP_ATTEMPTS * REAP_INTERVAL`; a process
	/// that ignores the kill is logged and left behind.
	pub fn kill(&mut self) -> Result<()> {
		if self.killed {
			return Ok(());
		}
		self.killed = true;
		debug!(target = "htmlpdf.runtime", pid = self.child.id(), port = self.port, "killing engine");
		self.child.kill()?;

		for _ in 0..REAP_ATTEMPTS {
			if self.child.try_wait()?.is_some() {
				return Ok(());
			}
			std::thread::sleep(REAP_INTERVAL);
		}
		warn!(target = "htmlpdf.runtime", pid = self.child.id(), "engine not reaped after kill");
		Ok(())
	}
}

impl Drop for EngineProcess {
	fn drop(&mut self) {
		if !self.killed {
			if let Err(e) = self.kill() {
				warn!(target = "htmlpdf.runtime", error = %e, "failed to kill engine on drop");
			}
		}
	}
}

/// Starts an engine and waits until its debugging endpoint answers.
pub async fn launch(options: &LaunchOptions) -> Result<EngineProcess> {
	if let Some(port) = options.port.filter(|p| *p != 0) {
		if !port_available(port) {
			return Err(Error::Launch(format!("debugging port {} is already in use", port)));
		}
	}

	let executable = match &options.executable {
		Some(path) => path.clone(),
		None => find_engine_executable().ok_or_else(|| {
			Error::Launch(
				"could not find a Chrome/Chromium executable; \
				 set CHROME_PATH or pass an executable path"
					.into(),
			)
		})?,
	};

	let port = resolve_port(options.port)?;
	let profile = if options.wants_own_profile() { Some(TempDir::new()?) } else { None };
	let args = options.command_line(port, profile.as_ref());

	let mut cmd = Command::new(&executable);
	cmd.args(&args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

	#[cfg(unix)]
	std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

	let child = cmd
		.spawn()
		.map_err(|e| Error::Launch(format!("failed to start {}: {}", executable.display(), e)))?;

	let mut process = EngineProcess {
		child,
		port,
		killed: false,
		_profile: profile,
	};

	let http = DevToolsHttp::with_timeout(Endpoint::local(port), Duration::from_millis(400))?;
	let started = Instant::now();
	let mut last_error = "endpoint not reachable".to_string();

	while started.elapsed() < options.startup_timeout {
		tokio::time::sleep(READY_POLL_INTERVAL).await;

		if let Ok(Some(status)) = process.child.try_wait() {
			process.killed = true;
			return Err(Error::Launch(format!(
				"{} exited before the debugging endpoint became available (status: {})",
				executable.display(),
				status
			)));
		}

		match http.version().await {
			Ok(info) => {
				info!(
					target = "htmlpdf.runtime",
					pid = process.pid(),
					port,
					browser = info.browser.as_deref().unwrap_or("unknown"),
					"engine launched"
				);
				return Ok(process);
			}
			Err(e) => last_error = e.to_string(),
		}
	}

	let _ = process.kill();
	Err(Error::Launch(format!(
		"engine started but debugging endpoint not available on port {} after {:?}: {}",
		port, options.startup_timeout, last_error
	)))
}
