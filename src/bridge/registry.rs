//! Callback Registry - the table of in-flight requests
//!
//! Every call owns one slot keyed by its request id. A slot is removed exactly
//! once, by whichever of {host reply, host error, timeout, cancel, drop} gets
//! there first. Removal happens under the lock and before any side effect, so
//! a late reply racing a timeout finds no slot and is ignored.

use parking_lot::Mutex;
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::trace;

use super::transport::TransportGuard;
use crate::error::BridgeError;
use crate::logging;

/// Outcome delivered to the caller of a bridge call
pub type Settlement = Result<Value, BridgeError>;

/// Opaque request id: a fixed prefix plus a session-wide counter (`__jp1`, `__jp2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RequestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

struct PendingRequest {
    path: String,
    sender: oneshot::Sender<Settlement>,
    timer: Option<AbortHandle>,
    guard: Option<TransportGuard>,
    created_at: Instant,
}

impl PendingRequest {
    /// Release the timer and the transport artefact of a removed slot.
    fn release(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        drop(self.guard.take());
    }
}

struct RegistryInner {
    prefix: String,
    next_id: AtomicU64,
    pending: Mutex<HashMap<RequestId, PendingRequest>>,
}

/// Shared handle to the pending-request table.
///
/// Cloning is cheap; all clones see the same table. The bridge owns one per
/// page session and never hands the table itself to callers.
#[derive(Clone)]
pub struct CallbackRegistry {
    inner: Arc<RegistryInner>,
}

impl CallbackRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                prefix: prefix.into(),
                next_id: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Allocate a fresh id and a slot for it. Ids are never reused.
    pub fn register(&self, path: &str) -> (RequestId, oneshot::Receiver<Settlement>) {
        let n = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let id = RequestId(format!("{}{}", self.inner.prefix, n));
        let (sender, receiver) = oneshot::channel();

        self.inner.pending.lock().insert(
            id.clone(),
            PendingRequest {
                path: path.to_string(),
                sender,
                timer: None,
                guard: None,
                created_at: Instant::now(),
            },
        );
        trace!(request_id = %id, path, "Registered pending request");
        (id, receiver)
    }

    /// Attach the timeout task of a slot. Aborts it if the slot is already gone.
    pub fn attach_timer(&self, id: &RequestId, timer: AbortHandle) {
        let orphan = {
            let mut pending = self.inner.pending.lock();
            match pending.get_mut(id) {
                Some(entry) => {
                    entry.timer = Some(timer);
                    None
                }
                None => Some(timer),
            }
        };
        if let Some(timer) = orphan {
            timer.abort();
        }
    }

    /// Attach the transport artefact of a slot. Releases it right away if the
    /// host already answered.
    pub fn attach_guard(&self, id: &RequestId, guard: TransportGuard) {
        let orphan = {
            let mut pending = self.inner.pending.lock();
            match pending.get_mut(id) {
                Some(entry) => {
                    entry.guard = Some(guard);
                    None
                }
                None => Some(guard),
            }
        };
        drop(orphan);
    }

    /// Settle a slot. Returns false when the id is unknown or already settled.
    pub fn settle(&self, id: &str, settlement: Settlement) -> bool {
        let Some(mut entry) = self.take(id) else {
            trace!(request_id = id, "Ignoring settlement of unknown or settled request");
            return false;
        };
        entry.release();

        let outcome = match &settlement {
            Ok(_) => "resolved",
            Err(BridgeError::Timeout) => "timeout",
            Err(BridgeError::Canceled) => "canceled",
            Err(_) => "rejected",
        };
        logging::log_request_event(
            id,
            &entry.path,
            outcome,
            entry.created_at.elapsed().as_millis() as u64,
        );

        // The receiver may already be gone; the slot is settled either way
        let _ = entry.sender.send(settlement);
        true
    }

    /// Reject a slot with `Canceled`. No-op after settlement.
    pub fn cancel(&self, id: &str) -> bool {
        self.settle(id, Err(BridgeError::Canceled))
    }

    /// Remove a slot nobody awaits any more, without settling it.
    pub fn forget(&self, id: &str) -> bool {
        let Some(mut entry) = self.take(id) else {
            return false;
        };
        entry.release();
        logging::log_request_event(
            id,
            &entry.path,
            "dropped",
            entry.created_at.elapsed().as_millis() as u64,
        );
        true
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.pending.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, id: &str) -> Option<PendingRequest> {
        self.inner.pending.lock().remove(id)
    }
}

/// Settles one specific slot. Handed to transports that deliver the reply
/// themselves (fetch) instead of through the page-global callback.
pub struct Settler {
    registry: CallbackRegistry,
    id: RequestId,
}

impl Settler {
    pub fn new(registry: CallbackRegistry, id: RequestId) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn settle(self, settlement: Settlement) -> bool {
        self.registry.settle(self.id.as_str(), settlement)
    }
}
