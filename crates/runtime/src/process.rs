//! Port helpers for locally launched engines.

use std::net::TcpListener;

/// Returns `true` when `port` can be bound on localhost.
pub fn port_available(port: u16) -> bool {
	TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Asks the OS for an unused localhost port.
///
/// The port is released before returning, so another process may grab it
/// first; the launcher treats a failed bind by the engine as a launch error.
pub fn free_port() -> std::io::Result<u16> {
	let listener = TcpListener::bind(("127.0.0.1", 0))?;
	Ok(listener.local_addr()?.port())
}

/// Resolves a launch port hint: `None` or `0` means "any free port".
pub fn resolve_port(hint: Option<u16>) -> std::io::Result<u16> {
	match hint {
		Some(port) if port != 0 => Ok(port),
		_ => free_port(),
	}
}
