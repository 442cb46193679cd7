//! Render HTML to PDF by driving a DevTools-controlled browser.
//!
//! ```ignore
//! use htmlpdf::{CreateOptions, create, trigger::Timer};
//!
//! let options = CreateOptions::new()
//!     .timeout_ms(10_000)
//!     .completion_trigger(Timer::from_millis(250));
//! let pdf = create("<h1>Quarterly report</h1>", &options).await?;
//! pdf.to_file("report.pdf").await?;
//! ```
//!
//! Each call acquires its own page session (launching a local engine unless
//! [`CreateOptions::remote`] is set), walks the [`Phase`] state machine and
//! releases everything it acquired before returning.

pub mod cancel;
pub mod content;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod navigator;
pub mod options;
pub mod page;
pub mod result;
pub mod trigger;

pub use cancel::CancellationEnvelope;
pub use error::{Error, Result};
pub use generator::{Generator, create};
pub use htmlpdf_protocol::{CookieParam, CookieSameSite, PrintToPdfParams};
pub use htmlpdf_runtime::{Endpoint, LaunchOptions};
pub use lifecycle::{ChromeLauncher, Connector, DevToolsConnector, EngineHandle, Launcher, Lease, ScopedLease, SessionManager};
pub use navigator::Phase;
pub use options::{ConsoleObserver, CreateOptions, ExceptionObserver};
pub use page::PageSession;
pub use result::CreateResult;
pub use trigger::{CompletionTrigger, WaitOutcome};
