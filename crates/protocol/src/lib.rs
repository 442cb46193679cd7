//! Wire types for the DevTools protocol.
//!
//! This crate contains the serde-serializable types exchanged with a
//! DevTools-speaking rendering engine over JSON-RPC. These types represent the
//! "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization and small
//!   read-only helpers
//! * 1:1 with protocol: Field names match the DevTools protocol schema
//! * Partial: Only the domains the PDF pipeline drives are modelled
//!
//! Higher-level APIs are built on top of these types in `htmlpdf`.

pub mod cookie;
pub mod methods;
pub mod options;
pub mod types;

pub use cookie::*;
pub use options::*;
pub use types::*;
