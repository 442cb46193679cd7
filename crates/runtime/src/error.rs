//! Error types for transport, connection, and process plumbing.

use thiserror::Error;

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Transport-level failure (framing, socket closed mid-send).
	#[error("transport error: {0}")]
	Transport(String),

	#[error("websocket error: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	/// Error response returned by the engine for a protocol call.
	#[error("protocol error {code} in {method}: {message}")]
	Protocol { method: String, code: i64, message: String },

	/// The response channel for a pending request was dropped.
	#[error("response channel closed")]
	ChannelClosed,

	/// The transport ended while requests were still pending.
	#[error("connection closed")]
	ConnectionClosed,

	/// The engine process could not be started or never became reachable.
	#[error("failed to launch engine: {0}")]
	Launch(String),

	/// DevTools HTTP endpoint failure.
	#[error("http endpoint error: {0}")]
	Http(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
