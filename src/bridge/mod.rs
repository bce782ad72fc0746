//! Request/response bridge between the preferences page and the host.
//!
//! A call allocates a request id, registers a pending slot, encodes the
//! request into a URL and triggers the transport. The slot is then settled by
//! exactly one of: the host's reply, the timeout, `cancel()`, or dropping the
//! handle.
//!
//! # Module Structure
//!
//! - `registry` - pending-request table keyed by request id
//! - `transport` - script-tag and fetch triggers
//! - `document` - DOM surface used by the script-tag trigger
//! - `named` - handlers keyed by a logical name, settled by pushes
//! - `router` - `onNotification` dispatch and fan-out
//! - `tick` - one-tick deferral
//! - `call` - `Bridge`, `PendingCall`, `PageEndpoint`

mod call;
mod document;
mod named;
mod registry;
mod router;
mod tick;
mod transport;

pub use call::{Bridge, CallOptions, CancelHandle, PageEndpoint, PendingCall};
pub use document::{Document, ElementId, MemoryDocument};
pub use named::{NamedCall, NamedHandlers};
pub use registry::{CallbackRegistry, RequestId, Settlement, Settler};
pub use router::NotificationRouter;
pub use tick::{defer, next_tick};
pub use transport::{
    FetchFuture, FetchTransport, Fetcher, ScriptTagTransport, Transport, TransportGuard,
};

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
