//! Named pending handlers
//!
//! Dialog flows (hotkey capture, file browser) are answered by a push that
//! carries the caller-chosen logical name instead of a request id. One handler
//! may be pending per name; registering a second one rejects the first with
//! `Superseded` so no caller is left waiting forever.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

use super::call::PendingCall;
use super::registry::Settlement;
use crate::error::BridgeError;

/// A removed handler, ready to be settled.
pub struct NamedSlot {
    name: String,
    token: u64,
    sender: oneshot::Sender<Settlement>,
}

impl NamedSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn send(self, settlement: Settlement) {
        debug!(name = %self.name, token = self.token, ok = settlement.is_ok(), "Settling named handler");
        let _ = self.sender.send(settlement);
    }
}

#[derive(Default)]
pub struct NamedHandlers {
    next_token: AtomicU64,
    slots: Mutex<HashMap<String, NamedSlot>>,
}

impl NamedHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, superseding any pending one.
    pub fn register(&self, name: &str) -> (u64, oneshot::Receiver<Settlement>) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        let previous = self.slots.lock().insert(
            name.to_string(),
            NamedSlot {
                name: name.to_string(),
                token,
                sender,
            },
        );
        if let Some(previous) = previous {
            debug!(name, "Named handler superseded");
            previous.send(Err(BridgeError::Superseded {
                name: name.to_string(),
            }));
        }
        (token, receiver)
    }

    /// Remove the handler pending under `name`.
    pub fn take(&self, name: &str) -> Option<NamedSlot> {
        self.slots.lock().remove(name)
    }

    /// Settle the handler pending under `name`, if any.
    pub fn settle(&self, name: &str, settlement: Settlement) -> bool {
        match self.take(name) {
            Some(slot) => {
                slot.send(settlement);
                true
            }
            None => false,
        }
    }

    /// Remove the handler under `name` only if it is still the one `token` registered.
    fn take_own(&self, name: &str, token: u64) -> Option<NamedSlot> {
        let mut slots = self.slots.lock();
        match slots.get(name) {
            Some(slot) if slot.token == token => slots.remove(name),
            _ => None,
        }
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.slots.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Future of a dialog flow: the initiating request plus the named handler
/// its push will settle.
///
/// Resolves with the push value. Rejects if the initiating request fails,
/// if the handler is superseded or dismissed, or on `cancel()`.
pub struct NamedCall {
    name: String,
    token: u64,
    handlers: Arc<NamedHandlers>,
    receiver: oneshot::Receiver<Settlement>,
    request: Option<PendingCall>,
}

impl NamedCall {
    pub(crate) fn new(
        name: &str,
        token: u64,
        handlers: Arc<NamedHandlers>,
        receiver: oneshot::Receiver<Settlement>,
        request: PendingCall,
    ) -> Self {
        Self {
            name: name.to_string(),
            token,
            handlers,
            receiver,
            request: Some(request),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reject with `Canceled`. No-op after settlement.
    pub fn cancel(&self) -> bool {
        if let Some(request) = &self.request {
            request.cancel();
        }
        match self.handlers.take_own(&self.name, self.token) {
            Some(slot) => {
                slot.send(Err(BridgeError::Canceled));
                true
            }
            None => false,
        }
    }
}

impl Future for NamedCall {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;

        if let Some(request) = this.request.as_mut() {
            if let Poll::Ready(ack) = Pin::new(request).poll(cx) {
                this.request = None;
                if let Err(e) = ack {
                    // Canceled acks are followed by the handler's own Canceled
                    if !matches!(e, BridgeError::Canceled) {
                        this.handlers.take_own(&this.name, this.token);
                        return Poll::Ready(Err(e));
                    }
                }
            }
        }

        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(settlement)) => Poll::Ready(settlement),
            Poll::Ready(Err(_)) => Poll::Ready(Err(BridgeError::Disconnected)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for NamedCall {
    fn drop(&mut self) {
        self.handlers.take_own(&self.name, self.token);
    }
}
