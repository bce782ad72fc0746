//! Fixture host answering the page over either transport.

use async_channel::Receiver;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::router::HostRouter;
use crate::bridge::{FetchFuture, Fetcher, PageEndpoint};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, HostError, ResultExt};
use crate::protocol::{encode_reply_body, encoder_for, DecodedRequest, RequestEncoder};

enum Answer {
    Routed(Result<Value, HostError>),
    UnknownResource(String),
}

/// In-process stand-in for the native host.
///
/// Decodes request URLs with the encoding of the page's config, dispatches them
/// through a [`HostRouter`] and replies the way the real host does.
#[derive(Clone)]
pub struct MockHost {
    router: Arc<HostRouter>,
    encoder: Arc<dyn RequestEncoder>,
    page: Arc<Mutex<Option<PageEndpoint>>>,
    seen: Arc<Mutex<Vec<DecodedRequest>>>,
}

impl MockHost {
    pub fn new(router: HostRouter, config: &BridgeConfig) -> Self {
        Self {
            router: Arc::new(router),
            encoder: Arc::from(encoder_for(config)),
            page: Arc::new(Mutex::new(None)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Attach the page whose callbacks and `onNotification` this host invokes.
    pub fn connect(&self, endpoint: PageEndpoint) {
        *self.page.lock() = Some(endpoint);
    }

    /// Every request decoded so far, in arrival order.
    pub fn requests_seen(&self) -> Vec<DecodedRequest> {
        self.seen.lock().clone()
    }

    fn answer(&self, url: &str) -> Result<(DecodedRequest, Answer), BridgeError> {
        let request = self
            .encoder
            .decode(url)
            .map_err(|e| BridgeError::Transport(format!("host could not decode {}: {}", url, e)))?;
        self.seen.lock().push(request.clone());

        let answer = if self.router.contains(&request.path) {
            Answer::Routed(self.router.dispatch(&request.path, &request.args))
        } else {
            debug!(path = %request.path, "Unknown resource");
            Answer::UnknownResource(request.path.clone())
        };
        Ok((request, answer))
    }

    /// Answer one script-tag request by invoking the page-global callback.
    ///
    /// Returns false when nothing could be delivered (no page connected, no
    /// callback id in the URL, or the request already settled).
    pub fn answer_script(&self, url: &str) -> bool {
        let Some(page) = self.page.lock().clone() else {
            warn!(url, "No page connected to answer script request");
            return false;
        };
        let Some((request, answer)) = self.answer(url).warn_on_err() else {
            return false;
        };
        let Some(callback) = request.callback else {
            warn!(path = %request.path, "Script request carries no callback id");
            return false;
        };

        match answer {
            Answer::Routed(Ok(data)) => page.invoke_callback(&callback, data, None),
            Answer::Routed(Err(error)) => {
                page.invoke_callback(&callback, Value::Null, Some(error.to_value()))
            }
            // The script fails to load and its onerror fires
            Answer::UnknownResource(path) => {
                page.reject(&callback, BridgeError::UnknownResource { path })
            }
        }
    }

    /// Answer script-tag requests as the page loads them, until the channel closes.
    pub async fn serve_scripts(self, requests: Receiver<String>) {
        while let Ok(url) = requests.recv().await {
            self.answer_script(&url);
        }
    }

    /// Send `onNotification(event_name, data)` to the connected page.
    pub fn notify(&self, event_name: &str, data: Value) -> Option<String> {
        let page = self.page.lock().clone()?;
        page.on_notification(event_name, data)
    }
}

impl Fetcher for MockHost {
    fn fetch(&self, url: &str) -> FetchFuture {
        // Unknown paths fail before any round trip
        let reply = self.answer(url).and_then(|(_, answer)| match answer {
            Answer::Routed(result) => Ok(encode_reply_body(&result)),
            Answer::UnknownResource(path) => Err(BridgeError::UnknownResource { path }),
        });
        Box::pin(async move { reply })
    }
}
