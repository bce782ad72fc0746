//! Preferences bridge - request/response plumbing between the launcher's
//! preferences page and its native host process.
//!
//! The embedding webview can only make outbound requests and receive one JSON
//! payload per request, so this crate turns URL-only requests into awaitable
//! calls, and routes the host's unsolicited pushes back to the page.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod protocol;

pub use bridge::{Bridge, CallOptions, PageEndpoint, PendingCall};
pub use error::{log_async_err, BridgeError, HostError, ResultExt};
