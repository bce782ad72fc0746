//! Transport Trigger - how an encoded request reaches the host
//!
//! - `ScriptTagTransport`: inserts a script element whose `src` is the request
//!   URL. The host intercepts the load and answers by invoking the page-global
//!   callback named after the request id (see `PageEndpoint`).
//! - `FetchTransport`: fetches the URL and decodes the `[payload, error]` body.
//!
//! Both return a [`TransportGuard`] that the registry drops when the request
//! settles, whatever the outcome.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use super::document::{Document, ElementId};
use super::registry::Settler;
use crate::config::TransportKind;
use crate::error::BridgeError;
use crate::protocol::decode_reply_body;

/// Cleanup tied to one in-flight request; runs once when dropped.
pub struct TransportGuard {
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl TransportGuard {
    pub fn new<F>(cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }
}

impl Drop for TransportGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Make the host observe `url`.
    ///
    /// Transports that receive the reply themselves settle through `settler`;
    /// script tags drop it and wait for the host to call back.
    fn trigger(&self, url: &str, settler: Settler) -> Result<Option<TransportGuard>, BridgeError>;
}

// ============================================
// SCRIPT TAG
// ============================================

pub struct ScriptTagTransport<D: Document> {
    document: Arc<D>,
}

impl<D: Document> ScriptTagTransport<D> {
    pub fn new(document: Arc<D>) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Arc<D> {
        &self.document
    }
}

impl<D: Document> Transport for ScriptTagTransport<D> {
    fn kind(&self) -> TransportKind {
        TransportKind::ScriptTag
    }

    fn trigger(&self, url: &str, _settler: Settler) -> Result<Option<TransportGuard>, BridgeError> {
        let element = self.document.create_script(url);

        // Next to the first script, or into <head> when the page has none
        let inserted = match self.document.first_script() {
            Some(first) => self.document.insert_before(element, first),
            None => match self.document.head() {
                Some(head) => self.document.append_child(head, element),
                None => false,
            },
        };
        if !inserted {
            self.document.remove(element);
            return Err(BridgeError::Transport(
                "document has neither a script nor a head element".to_string(),
            ));
        }

        trace!(element = element.0, url, "Inserted request script");
        let document = Arc::clone(&self.document);
        Ok(Some(TransportGuard::new(move || remove_script(&*document, element))))
    }
}

fn remove_script<D: Document + ?Sized>(document: &D, element: ElementId) {
    document.remove(element);
    trace!(element = element.0, "Removed request script");
}

// ============================================
// FETCH
// ============================================

/// Body of a fetch response, or the transport's own failure.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, BridgeError>> + Send>>;

/// Something that answers a GET for a request URL with a response body.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> FetchFuture;
}

pub struct FetchTransport<F: Fetcher> {
    fetcher: Arc<F>,
}

impl<F: Fetcher> FetchTransport<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> Transport for FetchTransport<F> {
    fn kind(&self) -> TransportKind {
        TransportKind::Fetch
    }

    fn trigger(&self, url: &str, settler: Settler) -> Result<Option<TransportGuard>, BridgeError> {
        let handle = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let response = self.fetcher.fetch(url);

        let task = handle.spawn(async move {
            let settlement = match response.await {
                Ok(body) => decode_reply_body(&body),
                Err(e) => Err(e),
            };
            debug!(request_id = %settler.id(), ok = settlement.is_ok(), "Fetch completed");
            settler.settle(settlement);
        });

        let abort = task.abort_handle();
        Ok(Some(TransportGuard::new(move || abort.abort())))
    }
}
