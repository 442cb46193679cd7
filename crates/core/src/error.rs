//! Error types for PDF generation.

use thiserror::Error;

/// Result alias for generation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// The request deadline elapsed, or a completion trigger gave up waiting.
	#[error("timeout: {0}")]
	Timeout(String),

	/// Connection failure, protocol error response, or engine launch failure.
	#[error(transparent)]
	Transport(#[from] htmlpdf_runtime::Error),

	/// Page-side script run by a completion trigger threw.
	#[error("evaluation failed: {0}")]
	Evaluation(String),

	/// The artifact could not be persisted.
	#[error("resource error: {0}")]
	Resource(#[source] std::io::Error),

	/// The engine returned an artifact that is not valid base64.
	#[error("invalid artifact encoding: {0}")]
	Decode(#[from] base64::DecodeError),
}

impl Error {
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	pub fn is_evaluation(&self) -> bool {
		matches!(self, Error::Evaluation(_))
	}

	pub fn is_transport(&self) -> bool {
		matches!(self, Error::Transport(_))
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::Transport(htmlpdf_runtime::Error::Serialization(e))
	}
}
