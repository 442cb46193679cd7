//! The artifact of a successful generation.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// A generated PDF, held as the base64 payload the engine returned.
///
/// Decoding happens on demand; [`to_reader`](Self::to_reader) yields a
/// `tokio::io::AsyncRead` over the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResult {
	data: String,
}

impl CreateResult {
	pub fn from_base64(data: impl Into<String>) -> Self {
		Self { data: data.into() }
	}

	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self::from_base64(STANDARD.encode(bytes))
	}

	pub fn to_base64(&self) -> &str {
		&self.data
	}

	pub fn into_base64(self) -> String {
		self.data
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(STANDARD.decode(&self.data)?)
	}

	pub fn to_reader(&self) -> Result<Cursor<Vec<u8>>> {
		Ok(Cursor::new(self.to_bytes()?))
	}

	/// Writes the decoded artifact to `path`.
	pub async fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let bytes = self.to_bytes()?;
		tokio::fs::write(path, bytes).await.map_err(Error::Resource)
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}
