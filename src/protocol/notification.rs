//! Push notifications sent by the host through `onNotification(eventName, data)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::response::is_truthy;

/// A hotkey was captured by the host's hotkey dialog
pub const HOTKEY_CAPTURED_EVENT: &str = "hotkey-captured";

/// A file was picked (or the picker dismissed) in the host's file dialog
pub const FILE_SELECT_EVENT: &str = "file-select";

/// An unsolicited host-to-page message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub event_name: String,
    pub data: Value,
}

impl Notification {
    pub fn new(event_name: impl Into<String>, data: Value) -> Self {
        Self {
            event_name: event_name.into(),
            data,
        }
    }
}

/// Value a hotkey dialog resolves with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyCapture {
    /// Accelerator string, e.g. `<Primary>space`
    pub value: String,
    /// Human-readable label, e.g. `Ctrl+Space`
    #[serde(default)]
    pub display_value: String,
}

/// What a push means for the named pending handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum PushKind {
    /// Settles the handler registered under `name`: `Some` resolves, `None` rejects.
    Named { name: String, value: Option<Value> },
    /// Not addressed to a named handler by its shape. May still be a legacy
    /// push whose event name is the handler name; see [`legacy_value`].
    Other,
}

/// Classify a push by its event name.
pub fn classify(event_name: &str, data: &Value) -> PushKind {
    match event_name {
        HOTKEY_CAPTURED_EVENT => {
            let Some(name) = str_field(data, "name") else {
                return PushKind::Other;
            };
            let value = str_field(data, "value").filter(|v| !v.is_empty()).map(|value| {
                let display_value = str_field(data, "displayValue").unwrap_or_default();
                hotkey_value(value, display_value)
            });
            PushKind::Named { name, value }
        }
        FILE_SELECT_EVENT => {
            let Some(name) = str_field(data, "name") else {
                return PushKind::Other;
            };
            let value = str_field(data, "path")
                .filter(|p| !p.is_empty())
                .map(Value::String);
            PushKind::Named { name, value }
        }
        _ => PushKind::Other,
    }
}

/// Settlement value of a legacy push `onNotification(<handler name>, {value, displayValue?})`.
///
/// Hotkey dialogs send a `displayValue` and resolve with a [`HotkeyCapture`];
/// file browsers send only the path.
pub fn legacy_value(data: &Value) -> Option<Value> {
    let value = data.get("value").filter(|v| is_truthy(v))?;
    match (value.as_str(), str_field(data, "displayValue")) {
        (Some(accel), Some(display)) => Some(hotkey_value(accel.to_string(), display)),
        _ => Some(value.clone()),
    }
}

fn hotkey_value(value: String, display_value: String) -> Value {
    serde_json::to_value(HotkeyCapture {
        value,
        display_value,
    })
    .unwrap_or(Value::Null)
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_file_select() {
        assert_eq!(
            classify(FILE_SELECT_EVENT, &json!({"name": "icon1", "path": "/tmp/a.png"})),
            PushKind::Named {
                name: "icon1".to_string(),
                value: Some(json!("/tmp/a.png"))
            }
        );
    }

    #[test]
    fn test_classify_file_select_cancelled() {
        for data in [
            json!({"name": "icon1", "path": ""}),
            json!({"name": "icon1", "path": null}),
            json!({"name": "icon1"}),
        ] {
            assert_eq!(
                classify(FILE_SELECT_EVENT, &data),
                PushKind::Named {
                    name: "icon1".to_string(),
                    value: None
                }
            );
        }
    }

    #[test]
    fn test_classify_hotkey() {
        let kind = classify(
            HOTKEY_CAPTURED_EVENT,
            &json!({"name": "hotkey-show-app", "value": "<Primary>space", "displayValue": "Ctrl+Space"}),
        );
        assert_eq!(
            kind,
            PushKind::Named {
                name: "hotkey-show-app".to_string(),
                value: Some(json!({"value": "<Primary>space", "displayValue": "Ctrl+Space"}))
            }
        );
    }

    #[test]
    fn test_classify_without_name_or_unknown_event() {
        assert_eq!(classify(FILE_SELECT_EVENT, &json!({"path": "/x"})), PushKind::Other);
        assert_eq!(classify("theme-changed", &json!({"name": "x"})), PushKind::Other);
    }

    #[test]
    fn test_legacy_value_shapes() {
        assert_eq!(
            legacy_value(&json!({"value": "<Alt>F1", "displayValue": "Alt+F1"})),
            Some(json!({"value": "<Alt>F1", "displayValue": "Alt+F1"}))
        );
        assert_eq!(
            legacy_value(&json!({"value": "/home/me/icon.svg"})),
            Some(json!("/home/me/icon.svg"))
        );
        assert_eq!(legacy_value(&json!({"value": null})), None);
        assert_eq!(legacy_value(&json!({})), None);
    }

    #[test]
    fn test_notification_serializes_camel_case() {
        let n = Notification::new(FILE_SELECT_EVENT, json!({"name": "icon"}));
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({"eventName": "file-select", "data": {"name": "icon"}})
        );
    }
}
