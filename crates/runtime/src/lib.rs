//! DevTools plumbing for htmlpdf.
//!
//! This crate owns everything between the PDF pipeline and the wire:
//! transports, the correlating [`Connection`], the DevTools HTTP helpers, and
//! local engine launch. It knows nothing about pages being "ready" or PDFs.

pub mod browser_finder;
pub mod connection;
pub mod devtools;
pub mod error;
pub mod fake_transport;
pub mod launcher;
pub mod process;
pub mod transport;

pub use connection::{Connection, EventStream};
pub use devtools::{DevToolsHttp, Endpoint};
pub use error::{Error, Result};
pub use fake_transport::{FakeTransportBuilder, FakeTransportController};
pub use launcher::{EngineProcess, LaunchOptions, launch};
pub use transport::{Transport, TransportParts, TransportReceiver, WebSocketTransport};
