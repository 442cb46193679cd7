//! Scripted fake engine for driving the pipeline without a browser.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use htmlpdf::{Connector, EngineHandle, Endpoint, Error, Generator, LaunchOptions, Launcher, PageSession, Result};
use htmlpdf_runtime::{FakeTransportBuilder, FakeTransportController};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const FAKE_PDF: &[u8] = b"%PDF-1.4 fake";

/// How the fake engine answers one request.
pub enum Reply {
	Result(Value),
	Error(i64, String),
	/// Answer, then emit events.
	ResultThenEvents(Value, Vec<(&'static str, Value)>),
	/// Emit events, then answer.
	EventsThenResult(Vec<(&'static str, Value)>, Value),
	Delayed(Duration, Box<Reply>),
	/// Never answer.
	Hang,
}

/// `(method, params, nth call of that method)`.
pub type Handler = Arc<dyn Fn(&str, &Value, usize) -> Reply + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Call {
	pub method: String,
	pub params: Value,
	pub at: Instant,
}

/// Connector and launcher backed by fake transports.
pub struct FakeBackend {
	handler: Handler,
	calls: Arc<Mutex<Vec<Call>>>,
	opens: AtomicUsize,
	closes: AtomicUsize,
	launches: AtomicUsize,
	kills: Arc<AtomicUsize>,
	fail_open: bool,
	fail_launch: bool,
	launch_delay: Duration,
	kill_delay: Duration,
}

impl FakeBackend {
	pub fn new(handler: impl Fn(&str, &Value, usize) -> Reply + Send + Sync + 'static) -> Self {
		Self {
			handler: Arc::new(handler),
			calls: Arc::new(Mutex::new(Vec::new())),
			opens: AtomicUsize::new(0),
			closes: AtomicUsize::new(0),
			launches: AtomicUsize::new(0),
			kills: Arc::new(AtomicUsize::new(0)),
			fail_open: false,
			fail_launch: false,
			launch_delay: Duration::ZERO,
			kill_delay: Duration::ZERO,
		}
	}

	/// A well-behaved engine.
	pub fn standard() -> Self {
		Self::new(standard_reply)
	}

	pub fn failing_open(mut self) -> Self {
		self.fail_open = true;
		self
	}

	pub fn failing_launch(mut self) -> Self {
		self.fail_launch = true;
		self
	}

	/// Launches take `delay` before succeeding or failing.
	pub fn with_launch_delay(mut self, delay: Duration) -> Self {
		self.launch_delay = delay;
		self
	}

	/// Killing a launched engine blocks the calling thread for `delay`.
	pub fn with_kill_delay(mut self, delay: Duration) -> Self {
		self.kill_delay = delay;
		self
	}

	pub fn into_generator(self) -> (Arc<Self>, Generator) {
		let backend = Arc::new(self);
		let generator = Generator::with_backends(backend.clone(), backend.clone());
		(backend, generator)
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn methods(&self) -> Vec<String> {
		self.calls.lock().iter().map(|c| c.method.clone()).collect()
	}

	pub fn count(&self, method: &str) -> usize {
		self.calls.lock().iter().filter(|c| c.method == method).count()
	}

	pub fn first(&self, method: &str) -> Option<Call> {
		self.calls.lock().iter().find(|c| c.method == method).cloned()
	}

	pub fn last(&self, method: &str) -> Option<Call> {
		self.calls.lock().iter().rev().find(|c| c.method == method).cloned()
	}

	pub fn position(&self, method: &str) -> Option<usize> {
		self.methods().iter().position(|m| m == method)
	}

	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}

	pub fn closes(&self) -> usize {
		self.closes.load(Ordering::SeqCst)
	}

	pub fn launches(&self) -> usize {
		self.launches.load(Ordering::SeqCst)
	}

	pub fn kills(&self) -> usize {
		self.kills.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Connector for FakeBackend {
	async fn open(&self, _endpoint: &Endpoint) -> Result<PageSession> {
		self.opens.fetch_add(1, Ordering::SeqCst);
		if self.fail_open {
			return Err(htmlpdf_runtime::Error::Http("connection refused".into()).into());
		}
		let (parts, controller) = FakeTransportBuilder::new().build();
		tokio::spawn(respond(Arc::new(controller), Arc::clone(&self.handler), Arc::clone(&self.calls)));
		Ok(PageSession::new(parts, Some("FAKE-TARGET".into())))
	}

	async fn close(&self, _endpoint: &Endpoint, session: PageSession) -> Result<()> {
		self.closes.fetch_add(1, Ordering::SeqCst);
		session.close().await
	}
}

#[async_trait]
impl Launcher for FakeBackend {
	async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn EngineHandle>> {
		self.launches.fetch_add(1, Ordering::SeqCst);
		if !self.launch_delay.is_zero() {
			tokio::time::sleep(self.launch_delay).await;
		}
		if self.fail_launch {
			return Err(htmlpdf_runtime::Error::Launch("no browser here".into()).into());
		}
		Ok(Box::new(FakeProcess {
			port: 9444,
			kills: Arc::clone(&self.kills),
			kill_delay: self.kill_delay,
		}))
	}
}

struct FakeProcess {
	port: u16,
	kills: Arc<AtomicUsize>,
	kill_delay: Duration,
}

impl EngineHandle for FakeProcess {
	fn port(&self) -> u16 {
		self.port
	}

	fn kill(&mut self) -> Result<()> {
		if !self.kill_delay.is_zero() {
			std::thread::sleep(self.kill_delay);
		}
		self.kills.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

async fn respond(controller: Arc<FakeTransportController>, handler: Handler, calls: Arc<Mutex<Vec<Call>>>) {
	let mut seen: HashMap<String, usize> = HashMap::new();
	while let Some(message) = controller.next_sent().await {
		let id = message["id"].as_u64().unwrap_or_default();
		let method = message["method"].as_str().unwrap_or_default().to_string();
		let params = message["params"].clone();

		let counter = seen.entry(method.clone()).or_default();
		let nth = *counter;
		*counter += 1;

		calls.lock().push(Call {
			method: method.clone(),
			params: params.clone(),
			at: Instant::now(),
		});
		deliver(&controller, id, handler(&method, &params, nth));
	}
}

fn deliver(controller: &Arc<FakeTransportController>, id: u64, reply: Reply) {
	match reply {
		Reply::Result(value) => controller.inject_response(id, value),
		Reply::Error(code, message) => controller.inject_error(id, code, &message),
		Reply::ResultThenEvents(value, events) => {
			controller.inject_response(id, value);
			for (method, params) in events {
				controller.inject_event(method, params);
			}
		}
		Reply::EventsThenResult(events, value) => {
			for (method, params) in events {
				controller.inject_event(method, params);
			}
			controller.inject_response(id, value);
		}
		Reply::Delayed(delay, inner) => {
			let controller = Arc::clone(controller);
			tokio::spawn(async move {
				tokio::time::sleep(delay).await;
				deliver(&controller, id, *inner);
			});
		}
		Reply::Hang => {}
	}
}

/// Answers every method the way a healthy engine would.
pub fn standard_reply(method: &str, _params: &Value, _nth: usize) -> Reply {
	match method {
		"Page.navigate" => Reply::ResultThenEvents(
			json!({ "frameId": "F1", "loaderId": "L1" }),
			vec![("Page.loadEventFired", json!({ "timestamp": 1.0 }))],
		),
		"Runtime.evaluate" => Reply::Result(boolean(true)),
		"Page.printToPDF" => Reply::Result(json!({ "data": STANDARD.encode(FAKE_PDF) })),
		_ => Reply::Result(json!({})),
	}
}

pub fn boolean(value: bool) -> Value {
	json!({ "result": { "type": "boolean", "value": value } })
}

pub fn thrown(description: &str) -> Value {
	json!({
		"result": { "type": "object", "subtype": "error", "description": description },
		"exceptionDetails": {
			"exceptionId": 1,
			"text": "Uncaught",
			"lineNumber": 0,
			"columnNumber": 0,
			"exception": { "type": "object", "subtype": "error", "description": description }
		}
	})
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

pub fn assert_timeout<T: std::fmt::Debug>(result: std::result::Result<T, Error>) {
	match result {
		Err(Error::Timeout(_)) => {}
		other => panic!("expected timeout, got {other:?}"),
	}
}
