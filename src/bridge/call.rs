//! The call contract: `call(path, args) -> PendingCall`.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, instrument};

use super::document::Document;
use super::named::NamedCall;
use super::registry::{CallbackRegistry, RequestId, Settlement, Settler};
use super::router::NotificationRouter;
use super::transport::{FetchTransport, Fetcher, ScriptTagTransport, Transport};
use crate::config::{BridgeConfig, ConfigError};
use crate::error::BridgeError;
use crate::protocol::{encoder_for, settlement_from_callback, Args, Notification, RequestEncoder};

/// Per-call overrides
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Replaces the configured timeout for this call
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

struct BridgeInner {
    config: BridgeConfig,
    registry: CallbackRegistry,
    router: Arc<NotificationRouter>,
    encoder: Box<dyn RequestEncoder>,
    transport: Box<dyn Transport>,
}

/// Page side of the request/response bridge.
///
/// Cloning is cheap and every clone shares the same pending-request table.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    pub fn new<T>(config: BridgeConfig, transport: T) -> Result<Self, ConfigError>
    where
        T: Transport + 'static,
    {
        config.validate()?;
        if transport.kind() != config.transport {
            return Err(ConfigError::TransportMismatch {
                configured: config.transport,
                actual: transport.kind(),
            });
        }

        Ok(Self {
            inner: Arc::new(BridgeInner {
                registry: CallbackRegistry::new(config.callback_prefix.clone()),
                router: Arc::new(NotificationRouter::new(config.push_settlement)),
                encoder: encoder_for(&config),
                transport: Box::new(transport),
                config,
            }),
        })
    }

    /// Script-tag bridge over `document`.
    pub fn script_tag<D: Document>(
        config: BridgeConfig,
        document: Arc<D>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, ScriptTagTransport::new(document))
    }

    /// Fetch bridge over `fetcher`.
    pub fn fetch<F: Fetcher>(config: BridgeConfig, fetcher: Arc<F>) -> Result<Self, ConfigError> {
        Self::new(config, FetchTransport::new(fetcher))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Issue a request. The returned handle resolves with the host's payload.
    pub fn call(&self, path: &str, args: impl Into<Args>) -> PendingCall {
        self.call_with(path, args, CallOptions::default())
    }

    #[instrument(name = "bridge_call", skip_all, fields(path = path))]
    pub fn call_with(&self, path: &str, args: impl Into<Args>, options: CallOptions) -> PendingCall {
        let inner = &self.inner;
        let args = args.into();
        let (id, receiver) = inner.registry.register(path);
        let call = PendingCall {
            id: id.clone(),
            registry: inner.registry.clone(),
            receiver,
        };

        let url = match inner.encoder.encode(path, &args, id.as_str()) {
            Ok(url) => url,
            Err(e) => {
                debug!(request_id = %id, error = %e, "Request could not be encoded");
                inner.registry.settle(id.as_str(), Err(e.into()));
                return call;
            }
        };

        if let Some(timeout) = options.timeout.or_else(|| inner.config.effective_timeout()) {
            if let Err(e) = self.arm_timer(&id, timeout) {
                inner.registry.settle(id.as_str(), Err(e));
                return call;
            }
        }

        debug!(request_id = %id, url = %url, "Triggering request");
        let settler = Settler::new(inner.registry.clone(), id.clone());
        match inner.transport.trigger(&url, settler) {
            Ok(Some(guard)) => inner.registry.attach_guard(&id, guard),
            Ok(None) => {}
            Err(e) => {
                inner.registry.settle(id.as_str(), Err(e));
            }
        }
        call
    }

    fn arm_timer(&self, id: &RequestId, timeout: Duration) -> Result<(), BridgeError> {
        let handle = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let deadline = tokio::time::Instant::now() + timeout;
        let registry = self.inner.registry.clone();
        let timer_id = id.clone();

        let task = handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            registry.settle(timer_id.as_str(), Err(BridgeError::Timeout));
        });
        self.inner.registry.attach_timer(id, task.abort_handle());
        Ok(())
    }

    /// Issue a dialog request whose answer arrives as a push addressed to `name`.
    pub fn call_named(&self, name: &str, path: &str, args: impl Into<Args>) -> NamedCall {
        let handlers = Arc::clone(self.inner.router.named());
        let (token, receiver) = handlers.register(name);
        let request = self.call(path, args);
        NamedCall::new(name, token, handlers, receiver, request)
    }

    /// The page-global entry points the host invokes.
    pub fn endpoint(&self) -> PageEndpoint {
        PageEndpoint {
            registry: self.inner.registry.clone(),
            router: Arc::clone(&self.inner.router),
        }
    }

    /// Receive every push the host sends.
    pub fn subscribe(&self) -> async_channel::Receiver<Notification> {
        self.inner.router.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.inner.registry.is_pending(id.as_str())
    }

    /// Whether a dialog flow is waiting for a push addressed to `name`.
    pub fn has_named_handler(&self, name: &str) -> bool {
        self.inner.router.named().is_pending(name)
    }
}

// ============================================
// PENDING CALL
// ============================================

/// Handle of one in-flight request.
///
/// Await it for the settlement. Dropping it before settlement releases the
/// request's slot and transport artefact.
pub struct PendingCall {
    id: RequestId,
    registry: CallbackRegistry,
    receiver: oneshot::Receiver<Settlement>,
}

impl PendingCall {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Reject with `Canceled`. Returns false if the call already settled.
    pub fn cancel(&self) -> bool {
        self.registry.cancel(self.id.as_str())
    }

    /// Detached cancel operation, usable after the call has been moved into a task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.id.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl Future for PendingCall {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(settlement)) => Poll::Ready(settlement),
            Poll::Ready(Err(_)) => Poll::Ready(Err(BridgeError::Disconnected)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.registry.forget(self.id.as_str());
    }
}

#[derive(Clone)]
pub struct CancelHandle {
    id: RequestId,
    registry: CallbackRegistry,
}

impl CancelHandle {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn cancel(&self) -> bool {
        self.registry.cancel(self.id.as_str())
    }
}

// ============================================
// PAGE ENDPOINT
// ============================================

/// What the host can call on the page: `window[<request id>](data, error)`
/// and `onNotification(eventName, data)`.
#[derive(Clone)]
pub struct PageEndpoint {
    registry: CallbackRegistry,
    router: Arc<NotificationRouter>,
}

impl PageEndpoint {
    /// Invoke the page-global callback `name`. Returns false for unknown or
    /// already settled ids, which are ignored.
    pub fn invoke_callback(&self, name: &str, data: Value, error: Option<Value>) -> bool {
        self.registry.settle(name, settlement_from_callback(data, error))
    }

    /// The script element of request `name` failed to load.
    pub fn reject(&self, name: &str, error: BridgeError) -> bool {
        self.registry.settle(name, Err(error))
    }

    pub fn on_notification(&self, event_name: &str, data: Value) -> Option<String> {
        self.router.dispatch(event_name, data)
    }
}
