//! Fixture host
//!
//! Satisfies the bridge contract in-process so the page side can be driven
//! without the native launcher: a route table, a host that answers both
//! transports, and an in-memory preferences back end.

mod fixtures;
mod mock;
mod router;

pub use fixtures::preferences_router;
pub use mock::MockHost;
pub use router::{HostRouter, RouteError, RouteHandler};
