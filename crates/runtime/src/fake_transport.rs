//! Fake transport for testing JSON-RPC correlation and event dispatch.
//!
//! Provides an in-memory transport for exercising the protocol layer without
//! a rendering engine.
//!
//! # Example
//!
//! ```ignore
//! let (parts, controller) = FakeTransportBuilder::new().build();
//! let connection = Arc::new(Connection::new(parts));
//!
//! tokio::spawn({
//!     let conn = Arc::clone(&connection);
//!     async move { conn.run().await }
//! });
//!
//! let fut = connection.send_message("Page.enable", json!({}));
//! controller.inject_response(0, json!({}));
//! let result = fut.await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::{Mutex, mpsc};

use crate::error::Result;
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Builder for creating fake transport instances.
#[derive(Default)]
pub struct FakeTransportBuilder {}

impl FakeTransportBuilder {
	pub fn new() -> Self {
		Self {}
	}

	/// Builds the fake transport.
	///
	/// Returns [`TransportParts`] for creating a
	/// [`Connection`](crate::connection::Connection) and a
	/// [`FakeTransportController`] for injecting messages and inspecting
	/// what was sent.
	pub fn build(self) -> (TransportParts, FakeTransportController) {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let sent_messages = Arc::new(Mutex::new(Vec::new()));

		let sender = FakeTransportSender {
			sent: Arc::clone(&sent_messages),
			outbound_tx,
		};

		let receiver = FakeTransportReceiver { inbound_rx, message_tx };

		let controller = FakeTransportController {
			inbound_tx: parking_lot::Mutex::new(Some(inbound_tx)),
			sent: sent_messages,
			outbound_rx: Mutex::new(outbound_rx),
		};

		let parts = TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		};

		(parts, controller)
	}
}

/// Controller for injecting responses/events and inspecting sent messages.
pub struct FakeTransportController {
	inbound_tx: parking_lot::Mutex<Option<mpsc::UnboundedSender<JsonValue>>>,
	sent: Arc<Mutex<Vec<JsonValue>>>,
	outbound_rx: Mutex<mpsc::UnboundedReceiver<JsonValue>>,
}

impl FakeTransportController {
	/// Injects a raw JSON message as if the engine had sent it.
	pub fn inject(&self, message: JsonValue) {
		if let Some(tx) = self.inbound_tx.lock().as_ref() {
			let _ = tx.send(message);
		}
	}

	pub fn inject_response(&self, id: u64, result: JsonValue) {
		self.inject(serde_json::json!({
			"id": id,
			"result": result
		}));
	}

	pub fn inject_error(&self, id: u64, code: i64, message: &str) {
		self.inject(serde_json::json!({
			"id": id,
			"error": {
				"code": code,
				"message": message
			}
		}));
	}

	pub fn inject_event(&self, method: &str, params: JsonValue) {
		self.inject(serde_json::json!({
			"method": method,
			"params": params
		}));
	}

	/// Awaits the next message written by the connection.
	///
	/// Returns `None` once the connection's sender has been dropped.
	pub async fn next_sent(&self) -> Option<JsonValue> {
		self.outbound_rx.lock().await.recv().await
	}

	/// Takes every sent message recorded so far, clearing the buffer.
	pub async fn take_sent(&self) -> Vec<JsonValue> {
		std::mem::take(&mut *self.sent.lock().await)
	}

	/// Simulates the engine hanging up.
	pub fn close(&self) {
		self.inbound_tx.lock().take();
	}
}

struct FakeTransportSender {
	sent: Arc<Mutex<Vec<JsonValue>>>,
	outbound_tx: mpsc::UnboundedSender<JsonValue>,
}

impl Transport for FakeTransportSender {
	fn send(&mut self, message: JsonValue) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		let sent = Arc::clone(&self.sent);
		let _ = self.outbound_tx.send(message.clone());
		Box::pin(async move {
			sent.lock().await.push(message);
			Ok(())
		})
	}
}

struct FakeTransportReceiver {
	inbound_rx: mpsc::UnboundedReceiver<JsonValue>,
	message_tx: mpsc::UnboundedSender<JsonValue>,
}

impl TransportReceiver for FakeTransportReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			while let Some(message) = self.inbound_rx.recv().await {
				if self.message_tx.send(message).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn sent_messages_are_observable_in_order() {
		let (mut parts, controller) = FakeTransportBuilder::new().build();

		parts.sender.send(serde_json::json!({"id": 0})).await.unwrap();
		parts.sender.send(serde_json::json!({"id": 1})).await.unwrap();

		assert_eq!(controller.next_sent().await.unwrap()["id"], 0);
		assert_eq!(controller.next_sent().await.unwrap()["id"], 1);
		assert_eq!(controller.take_sent().await.len(), 2);
		assert!(controller.take_sent().await.is_empty());
	}

	#[tokio::test]
	async fn receiver_stops_after_close() {
		let (parts, controller) = FakeTransportBuilder::new().build();
		let mut rx = parts.message_rx;
		let task = tokio::spawn(parts.receiver.run());

		controller.inject_event("Page.loadEventFired", serde_json::json!({}));
		assert_eq!(rx.recv().await.unwrap()["method"], "Page.loadEventFired");

		controller.close();
		task.await.unwrap().unwrap();
		assert!(rx.recv().await.is_none());
	}
}
