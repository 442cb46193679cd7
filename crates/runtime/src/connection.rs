//! JSON-RPC connection layer for the DevTools protocol.
//!
//! This module implements the request/response correlation layer on top of a
//! transport. It handles:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Distinguishing events from responses
//! - Fanning events out to subscribers by method name
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send_message`] with a method and params
//! 2. Connection generates a unique ID and parks a oneshot sender
//! 3. Request is serialized and written through the transport
//! 4. The message loop ([`Connection::run`]) receives the response
//! 5. Response is correlated by ID and delivered through the oneshot
//!
//! Events (messages without an `id`) are delivered to every live
//! [`EventStream`] registered for their method. When the transport ends, all
//! pending requests fail with [`Error::ConnectionClosed`] and every event
//! stream terminates.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Protocol request message.
///
/// ```json
/// { "id": 7, "method": "Page.navigate", "params": { "url": "https://example.com" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	pub id: u64,
	pub method: String,
	pub params: Value,
}

/// Protocol response message, carrying either `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Protocol error details.
///
/// ```json
/// { "id": 7, "error": { "code": -32000, "message": "Cannot navigate to invalid URL" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// Protocol event message; distinguished from responses by the absence of `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Discriminated union of protocol messages.
///
/// `untagged` tries `Response` first, which requires an `id` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Response(Response),
	Event(Event),
}

/// Stream of event params for one method.
pub type EventStream = mpsc::UnboundedReceiver<Value>;

struct PendingCall {
	method: String,
	tx: oneshot::Sender<Result<Value>>,
}

/// JSON-RPC connection to a DevTools endpoint.
///
/// Share it behind an `Arc`; concurrent requests are supported. [`run`]
/// must be spawned once for responses and events to flow.
///
/// [`run`]: Connection::run
pub struct Connection {
	last_id: AtomicU64,
	callbacks: Arc<Mutex<HashMap<u64, PendingCall>>>,
	subscribers: parking_lot::Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
	sender: Mutex<Box<dyn Transport>>,
	receiver: parking_lot::Mutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	closed: AtomicBool,
}

impl Connection {
	pub fn new(parts: TransportParts) -> Self {
		Self {
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(Mutex::new(HashMap::new())),
			subscribers: parking_lot::Mutex::new(HashMap::new()),
			sender: Mutex::new(parts.sender),
			receiver: parking_lot::Mutex::new(Some(parts.receiver)),
			message_rx: Mutex::new(Some(parts.message_rx)),
			closed: AtomicBool::new(false),
		}
	}

	/// Sends a command and awaits its response.
	///
	/// Fails with [`Error::Protocol`] when the engine answers with an error,
	/// and with [`Error::ConnectionClosed`] when the transport ends first.
	pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
		if self.is_closed() {
			return Err(Error::ConnectionClosed);
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(
			id,
			PendingCall {
				method: method.to_string(),
				tx,
			},
		);

		// The loop may have drained callbacks between the check above and the insert.
		if self.is_closed() {
			self.callbacks.lock().await.remove(&id);
			return Err(Error::ConnectionClosed);
		}

		let request = serde_json::to_value(Request {
			id,
			method: method.to_string(),
			params,
		})?;
		trace!(target = "htmlpdf.runtime", id, %method, "request");

		if let Err(e) = self.sender.lock().await.send(request).await {
			self.callbacks.lock().await.remove(&id);
			return Err(e);
		}

		rx.await.map_err(|_| Error::ChannelClosed).and_then(|result| result)
	}

	/// Registers interest in an event method.
	///
	/// Subscribe before issuing the command that triggers the event, or it may
	/// be missed.
	pub fn subscribe(&self, method: &str) -> EventStream {
		let (tx, rx) = mpsc::unbounded_channel();
		if !self.is_closed() {
			self.subscribers.lock().entry(method.to_string()).or_default().push(tx);
		}
		rx
	}

	/// Returns `true` once the message loop has ended.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Closes the sending half; the message loop ends when the peer hangs up.
	pub async fn close(&self) -> Result<()> {
		self.sender.lock().await.close().await
	}

	/// Runs the message dispatch loop until the transport closes.
	///
	/// Only the first call does any work; later calls return immediately.
	pub async fn run(&self) {
		let Some(receiver) = self.receiver.lock().take() else {
			debug!(target = "htmlpdf.runtime", "message loop already started");
			return;
		};
		let Some(mut message_rx) = self.message_rx.lock().await.take() else {
			return;
		};

		let transport_handle = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				debug!(target = "htmlpdf.runtime", error = %e, "transport receiver ended with error");
			}
		});

		while let Some(message_value) = message_rx.recv().await {
			match serde_json::from_value::<Message>(message_value.clone()) {
				Ok(message) => {
					if let Err(e) = self.dispatch(message).await {
						error!(target = "htmlpdf.runtime", error = %e, "error dispatching message");
					}
				}
				Err(e) => {
					error!(target = "htmlpdf.runtime", error = %e, message = %message_value, "failed to parse message");
				}
			}
		}

		debug!(target = "htmlpdf.runtime", "message loop ended (transport closed)");
		self.shutdown().await;
		let _ = transport_handle.await;
	}

	async fn shutdown(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let pending: Vec<PendingCall> = self.callbacks.lock().await.drain().map(|(_, call)| call).collect();
		for call in pending {
			debug!(target = "htmlpdf.runtime", method = %call.method, "failing pending request");
			let _ = call.tx.send(Err(Error::ConnectionClosed));
		}
		self.subscribers.lock().clear();
	}

	async fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let call = self.callbacks.lock().await.remove(&response.id).ok_or_else(|| {
					Error::Transport(format!("cannot find request to respond: id={}", response.id))
				})?;

				let result = match response.error {
					Some(payload) => Err(Error::Protocol {
						method: call.method,
						code: payload.code,
						message: payload.message,
					}),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				// Receiver may have been dropped by a canceled caller.
				let _ = call.tx.send(result);
				Ok(())
			}
			Message::Event(event) => {
				trace!(target = "htmlpdf.runtime", method = %event.method, "event");
				let mut subscribers = self.subscribers.lock();
				if let Some(list) = subscribers.get_mut(&event.method) {
					list.retain(|tx| tx.send(event.params.clone()).is_ok());
					if list.is_empty() {
						subscribers.remove(&event.method);
					}
				}
				Ok(())
			}
		}
	}
}
