//! Push-Notification Router
//!
//! The host calls `onNotification(eventName, data)` at arbitrary times. Known
//! event kinds settle the named handler their payload names; every push, matched
//! or not, is also broadcast to the subscribers of the fan-out channel.

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use super::named::NamedHandlers;
use super::tick;
use crate::config::PushSettlement;
use crate::error::BridgeError;
use crate::logging;
use crate::protocol::{classify, legacy_value, Notification, PushKind};

pub struct NotificationRouter {
    named: Arc<NamedHandlers>,
    subscribers: Mutex<Vec<Sender<Notification>>>,
    push_settlement: PushSettlement,
}

impl NotificationRouter {
    pub fn new(push_settlement: PushSettlement) -> Self {
        Self {
            named: Arc::new(NamedHandlers::new()),
            subscribers: Mutex::new(Vec::new()),
            push_settlement,
        }
    }

    pub fn named(&self) -> &Arc<NamedHandlers> {
        &self.named
    }

    /// New receiver of every push. Dropping it unsubscribes.
    pub fn subscribe(&self) -> Receiver<Notification> {
        let (tx, rx) = async_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Route one push. Returns the name of the handler it settled, if any.
    pub fn dispatch(&self, event_name: &str, data: Value) -> Option<String> {
        let handled = match classify(event_name, &data) {
            PushKind::Named { name, value } => self.settle_named(&name, value),
            PushKind::Other if self.named.is_pending(event_name) => {
                self.settle_named(event_name, legacy_value(&data))
            }
            PushKind::Other => None,
        };

        logging::log_notification(event_name, handled.as_deref());
        self.publish(Notification::new(event_name, data));
        handled
    }

    fn settle_named(&self, name: &str, value: Option<Value>) -> Option<String> {
        let Some(slot) = self.named.take(name) else {
            trace!(name, "Push for a name with no pending handler dropped");
            return None;
        };
        let settlement = value.ok_or_else(|| BridgeError::Dismissed {
            name: name.to_string(),
        });

        match self.push_settlement {
            PushSettlement::Immediate => slot.send(settlement),
            PushSettlement::NextTick => tick::defer(move || slot.send(settlement)),
        }
        Some(name.to_string())
    }

    fn publish(&self, notification: Notification) {
        let mut subscribers = self.subscribers.lock();
        // Closed receivers are pruned; unbounded senders never report full
        subscribers.retain(|tx| tx.try_send(notification.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FILE_SELECT_EVENT;
    use serde_json::json;

    #[test]
    fn test_unmatched_known_push_is_dropped_but_broadcast() {
        let router = NotificationRouter::new(PushSettlement::Immediate);
        let rx = router.subscribe();

        let handled = router.dispatch(FILE_SELECT_EVENT, json!({"name": "icon1", "path": ""}));
        assert_eq!(handled, None);

        let seen = rx.try_recv().unwrap();
        assert_eq!(seen.event_name, FILE_SELECT_EVENT);
    }

    #[test]
    fn test_file_select_resolves_named_handler() {
        let router = NotificationRouter::new(PushSettlement::Immediate);
        let (_, mut rx) = router.named().register("icon1");

        let handled = router.dispatch(FILE_SELECT_EVENT, json!({"name": "icon1", "path": "/a.png"}));
        assert_eq!(handled.as_deref(), Some("icon1"));
        assert_eq!(rx.try_recv().unwrap(), Ok(json!("/a.png")));
        assert!(router.named().is_empty());
    }

    #[test]
    fn test_empty_path_dismisses_named_handler() {
        let router = NotificationRouter::new(PushSettlement::Immediate);
        let (_, mut rx) = router.named().register("icon1");

        router.dispatch(FILE_SELECT_EVENT, json!({"name": "icon1", "path": null}));
        assert_eq!(
            rx.try_recv().unwrap(),
            Err(BridgeError::Dismissed {
                name: "icon1".to_string()
            })
        );
    }

    #[test]
    fn test_legacy_push_uses_event_name_as_handler_name() {
        let router = NotificationRouter::new(PushSettlement::Immediate);
        let (_, mut rx) = router.named().register("hotkey-show-app");

        router.dispatch(
            "hotkey-show-app",
            json!({"value": "<Primary>space", "displayValue": "Ctrl+Space"}),
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Ok(json!({"value": "<Primary>space", "displayValue": "Ctrl+Space"}))
        );
    }

    #[test]
    fn test_unknown_event_without_handler_is_ignored() {
        let router = NotificationRouter::new(PushSettlement::Immediate);
        assert_eq!(router.dispatch("theme-changed", json!({"name": "dark"})), None);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let router = NotificationRouter::new(PushSettlement::Immediate);
        let kept = router.subscribe();
        drop(router.subscribe());
        assert_eq!(router.subscriber_count(), 2);

        router.dispatch("anything", Value::Null);
        assert_eq!(router.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_next_tick_settlement_is_deferred() {
        let router = NotificationRouter::new(PushSettlement::NextTick);
        let (_, mut rx) = router.named().register("icon1");

        router.dispatch(FILE_SELECT_EVENT, json!({"name": "icon1", "path": "/b.png"}));
        assert!(rx.try_recv().is_err());
        assert!(router.named().is_empty());

        assert_eq!(rx.await.unwrap(), Ok(json!("/b.png")));
    }
}
