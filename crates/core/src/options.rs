//! Caller-facing configuration for one generation request.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use htmlpdf_protocol::{ConsoleApiCalled, CookieParam, ExceptionThrown, PrintToPdfParams};
use htmlpdf_runtime::{Endpoint, LaunchOptions};

use crate::trigger::CompletionTrigger;

/// Callback invoked for each `console.*` call on the page.
pub type ConsoleObserver = Arc<dyn Fn(&ConsoleApiCalled) + Send + Sync>;

/// Callback invoked for each uncaught page exception.
pub type ExceptionObserver = Arc<dyn Fn(&ExceptionThrown) + Send + Sync>;

/// Options for [`create`](crate::create).
///
/// Built with chained setters and read-only once generation starts.
#[derive(Clone, Default)]
pub struct CreateOptions {
	/// Attach to this engine instead of launching one.
	pub remote: Option<Endpoint>,
	/// Used only when `remote` is `None`.
	pub launch: LaunchOptions,
	/// Overall deadline, measured from the start of the request.
	pub timeout: Option<Duration>,
	pub clear_cache: bool,
	/// Injected before navigation.
	pub cookies: Vec<CookieParam>,
	pub extra_http_headers: BTreeMap<String, String>,
	/// Forwarded verbatim to `Page.printToPDF`.
	pub print_options: PrintToPdfParams,
	pub completion_trigger: Option<Arc<dyn CompletionTrigger>>,
	pub console_observer: Option<ConsoleObserver>,
	pub exception_observer: Option<ExceptionObserver>,
}

impl CreateOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn remote(mut self, host: impl Into<String>, port: u16) -> Self {
		self.remote = Some(Endpoint::new(host, port));
		self
	}

	pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
		self.launch.executable = Some(path.into());
		self
	}

	pub fn port(mut self, port: u16) -> Self {
		self.launch.port = Some(port);
		self
	}

	pub fn launch_flag(mut self, flag: impl Into<String>) -> Self {
		self.launch.flags.push(flag.into());
		self
	}

	pub fn headless(mut self, headless: bool) -> Self {
		self.launch.headless = headless;
		self
	}

	/// Sets the deadline in milliseconds; zero or negative disables it.
	pub fn timeout_ms(mut self, millis: i64) -> Self {
		self.timeout = u64::try_from(millis)
			.ok()
			.filter(|ms| *ms > 0)
			.map(Duration::from_millis);
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout).filter(|t| !t.is_zero());
		self
	}

	pub fn clear_cache(mut self, clear: bool) -> Self {
		self.clear_cache = clear;
		self
	}

	pub fn cookie(mut self, cookie: CookieParam) -> Self {
		self.cookies.push(cookie);
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_http_headers.insert(name.into(), value.into());
		self
	}

	pub fn print_options(mut self, params: PrintToPdfParams) -> Self {
		self.print_options = params;
		self
	}

	pub fn completion_trigger(mut self, trigger: impl CompletionTrigger + 'static) -> Self {
		self.completion_trigger = Some(Arc::new(trigger));
		self
	}

	pub fn shared_trigger(mut self, trigger: Arc<dyn CompletionTrigger>) -> Self {
		self.completion_trigger = Some(trigger);
		self
	}

	pub fn on_console(mut self, observer: impl Fn(&ConsoleApiCalled) + Send + Sync + 'static) -> Self {
		self.console_observer = Some(Arc::new(observer));
		self
	}

	pub fn on_exception(mut self, observer: impl Fn(&ExceptionThrown) + Send + Sync + 'static) -> Self {
		self.exception_observer = Some(Arc::new(observer));
		self
	}

	/// Whether PreNavigate needs the Network domain.
	pub(crate) fn needs_network(&self) -> bool {
		self.clear_cache || !self.cookies.is_empty() || !self.extra_http_headers.is_empty()
	}
}

impl fmt::Debug for CreateOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CreateOptions")
			.field("remote", &self.remote)
			.field("launch", &self.launch)
			.field("timeout", &self.timeout)
			.field("clear_cache", &self.clear_cache)
			.field("cookies", &self.cookies.len())
			.field("extra_http_headers", &self.extra_http_headers.keys().collect::<Vec<_>>())
			.field("print_options", &self.print_options)
			.field("completion_trigger", &self.completion_trigger)
			.field("console_observer", &self.console_observer.is_some())
			.field("exception_observer", &self.exception_observer.is_some())
			.finish()
	}
}
