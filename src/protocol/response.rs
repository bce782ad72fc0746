//! Decoding host replies into settlements.
//!
//! Two reply shapes exist:
//! - script tags: the host invokes the page-global callback with `(data, error)`;
//! - fetch: the body is a JSON array `[payload, error]` (the host omits the
//!   error slot on success, so `[payload]` is accepted too).
//!
//! In both, the error slot follows JavaScript truthiness: `null`, `false`, `0`
//! and `""` mean "no error".

use serde_json::Value;
use tracing::warn;

use crate::error::{BridgeError, HostError};

/// Maximum length of a raw reply quoted in logs and errors
const MAX_RAW_PREVIEW: usize = 200;

/// Get a truncated preview of a raw reply for logging
pub fn log_preview(raw: &str) -> (&str, usize) {
    let len = raw.len();
    if len > MAX_RAW_PREVIEW {
        let mut end = MAX_RAW_PREVIEW;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        (&raw[..end], len)
    } else {
        (raw, len)
    }
}

/// JavaScript truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Settlement for a callback invocation `(data, error)`.
pub fn settlement_from_callback(data: Value, error: Option<Value>) -> Result<Value, BridgeError> {
    match error {
        Some(error) if is_truthy(&error) => Err(BridgeError::Host(HostError::from_value(error))),
        _ => Ok(data),
    }
}

/// Settlement for a fetch body `[payload, error]`.
///
/// Anything that is not a one- or two-element JSON array is a protocol
/// violation and rejects with `MalformedResponse`.
pub fn decode_reply_body(body: &[u8]) -> Result<Value, BridgeError> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            let raw = String::from_utf8_lossy(body);
            let (preview, raw_len) = log_preview(&raw);
            warn!(raw = %preview, raw_len, error = %e, "Host reply is not JSON");
            return Err(BridgeError::malformed(format!("reply is not JSON: {}", e)));
        }
    };

    let Value::Array(mut items) = value else {
        warn!(reply = %value, "Host reply is not a [payload, error] array");
        return Err(BridgeError::malformed("reply is not a [payload, error] array"));
    };

    match items.len() {
        1 | 2 => {
            let error = if items.len() == 2 { items.pop() } else { None };
            let payload = items.pop().unwrap_or(Value::Null);
            settlement_from_callback(payload, error)
        }
        n => {
            warn!(len = n, "Host reply array has the wrong length");
            Err(BridgeError::malformed(format!(
                "reply array has {} elements, expected 1 or 2",
                n
            )))
        }
    }
}

/// Host side: serialize a handler result the way the host replies to a fetch.
pub fn encode_reply_body(result: &Result<Value, HostError>) -> Vec<u8> {
    let reply = match result {
        Ok(payload) => Value::Array(vec![payload.clone()]),
        Err(error) => Value::Array(vec![Value::Null, error.to_value()]),
    };
    reply.to_string().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("oops")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn test_callback_without_error_resolves_data() {
        assert_eq!(
            settlement_from_callback(json!({"a": 1}), None),
            Ok(json!({"a": 1}))
        );
        assert_eq!(
            settlement_from_callback(json!(1), Some(Value::Null)),
            Ok(json!(1))
        );
        assert_eq!(
            settlement_from_callback(json!(1), Some(json!(""))),
            Ok(json!(1))
        );
    }

    #[test]
    fn test_callback_with_error_rejects_verbatim() {
        let err = settlement_from_callback(
            Value::Null,
            Some(json!({"message": "nope", "type": "PrefsApiError", "errorName": "Other"})),
        )
        .unwrap_err();
        let BridgeError::Host(host) = err else {
            panic!("expected host error");
        };
        assert_eq!(host.message(), "nope");
        assert_eq!(host.error_type(), Some("PrefsApiError"));
    }

    #[test]
    fn test_body_success_shapes() {
        assert_eq!(decode_reply_body(br#"[{"x":1}]"#), Ok(json!({"x": 1})));
        assert_eq!(decode_reply_body(br#"[{"x":1}, null]"#), Ok(json!({"x": 1})));
        assert_eq!(decode_reply_body(br#"[null]"#), Ok(Value::Null));
    }

    #[test]
    fn test_body_error_discards_payload() {
        let err = decode_reply_body(br#"[{"partial":true}, "disk full"]"#).unwrap_err();
        assert_eq!(
            err,
            BridgeError::Host(HostError::Message("disk full".to_string()))
        );
    }

    #[test]
    fn test_body_malformed_shapes() {
        for body in [
            &b"not json"[..],
            br#"{"payload": 1}"#,
            br#"[]"#,
            br#"[1, null, 3]"#,
            br#""text""#,
        ] {
            assert!(
                matches!(
                    decode_reply_body(body),
                    Err(BridgeError::MalformedResponse { .. })
                ),
                "body {:?} should be malformed",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_reply_body_round_trip() {
        let ok = encode_reply_body(&Ok(json!({"id": "abc"})));
        assert_eq!(decode_reply_body(&ok), Ok(json!({"id": "abc"})));

        let failed = encode_reply_body(&Err(HostError::structured("boom", "RuntimeError")));
        assert_eq!(
            decode_reply_body(&failed),
            Err(BridgeError::Host(HostError::structured("boom", "RuntimeError")))
        );
    }

    #[test]
    fn test_log_preview_respects_char_boundaries() {
        let raw = "é".repeat(150);
        let (preview, len) = log_preview(&raw);
        assert_eq!(len, 300);
        assert!(preview.len() <= MAX_RAW_PREVIEW);
    }
}
