//! Request URL encoders and their host-side decoders.
//!
//! The webview can only hand the host a URL, so every argument travels in the
//! query string. Three layouts exist, one per [`EncodingKind`]:
//!
//! - `B64Json`: `path?key=value&obj_b64json=<base64 json>&callback=__jp1`.
//!   Strings travel as plain percent-encoded values; every other JSON value is
//!   wrapped as base64 of its UTF-8 JSON text so the host gets its type back.
//! - `JsonQuery`: `path?<percent-encoded {"key": value, ..., "callback": "__jp1"}>`
//! - `ArgsArray`: `path?<percent-encoded [arg0, arg1, ...]>`, no callback id.
//!
//! Each encoder also implements the matching decode step, which is what the
//! host does with the URL it intercepts.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use url::Url;

use super::args::Args;
use crate::config::{BridgeConfig, EncodingKind, B64_JSON_SUFFIX};
use crate::error::{DecodeError, EncodeError};

/// Characters left alone by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Artefact the embedded webview prepends to paths of scheme-relative URLs.
const NULL_HOST_SEGMENT: &str = "/null";

/// A request as the host sees it after decoding the URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRequest {
    pub path: String,
    pub args: Args,
    pub callback: Option<String>,
}

/// Turns `(path, args, request id)` into a fetchable URL, and back.
pub trait RequestEncoder: Send + Sync {
    fn kind(&self) -> EncodingKind;

    fn encode(&self, path: &str, args: &Args, request_id: &str) -> Result<String, EncodeError>;

    fn decode(&self, url: &str) -> Result<DecodedRequest, DecodeError>;
}

/// Build the encoder selected by the config.
pub fn encoder_for(config: &BridgeConfig) -> Box<dyn RequestEncoder> {
    match config.encoding {
        EncodingKind::B64Json => Box::new(B64JsonEncoder::new(
            &config.base_url,
            &config.callback_key,
        )),
        EncodingKind::JsonQuery => Box::new(JsonQueryEncoder::new(
            &config.base_url,
            &config.callback_key,
        )),
        EncodingKind::ArgsArray => Box::new(ArgsArrayEncoder::new(&config.base_url)),
    }
}

/// `encodeURIComponent` equivalent.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// `decodeURIComponent` equivalent.
pub fn decode_component(input: &str) -> Result<String, DecodeError> {
    percent_decode_str(input)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| DecodeError::InvalidQuery(e.to_string()))
}

/// Join base url, resource path and an encoded query.
///
/// Appends with `&` when the path already carries a query, `?` otherwise, and
/// collapses the `?&` left behind by an empty existing query.
fn join_query(base_url: &str, path: &str, query: &str) -> String {
    let mut url = String::with_capacity(base_url.len() + path.len() + query.len() + 1);
    if !path.contains("://") {
        // "prefs://" + "/get/all" keeps the empty authority: prefs:///get/all
        if base_url.ends_with("://") {
            url.push_str(base_url);
        } else {
            url.push_str(base_url.trim_end_matches('/'));
        }
        if !path.starts_with('/') {
            url.push('/');
        }
    }
    url.push_str(path);
    if !query.is_empty() {
        url.push(if path.contains('?') { '&' } else { '?' });
        url.push_str(query);
    }
    url.replace("?&", "?")
}

/// Split a request URL into its normalized path and raw query.
fn split_url(url: &str) -> Result<(String, Option<String>), DecodeError> {
    let parsed = Url::parse(url).map_err(|e| DecodeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut path = parsed.path().to_string();
    // prefs://null/get/all parses "null" as the host already
    if parsed.host_str() != Some("null") {
        if let Some(rest) = path.strip_prefix(NULL_HOST_SEGMENT) {
            if rest.is_empty() || rest.starts_with('/') {
                path = rest.to_string();
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }

    let query = parsed.query().filter(|q| !q.is_empty()).map(str::to_string);
    Ok((path, query))
}

fn check_reserved(args: &Args, callback_key: &str) -> Result<(), EncodeError> {
    if args.get(callback_key).is_some() {
        return Err(EncodeError::ReservedKey(callback_key.to_string()));
    }
    Ok(())
}

/// The encoded argument payload of a query, skipping `key=value` segments
/// that came with the resource path. Percent-encoded JSON never carries a raw `=`.
fn payload_segment(query: Option<&str>) -> Option<&str> {
    query?
        .rsplit('&')
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.contains('='))
}

// ============================================
// B64 JSON (key=value pairs)
// ============================================

pub struct B64JsonEncoder {
    base_url: String,
    callback_key: String,
}

impl B64JsonEncoder {
    pub fn new(base_url: &str, callback_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            callback_key: callback_key.to_string(),
        }
    }

    fn encode_pair(key: &str, value: &Value) -> Result<String, EncodeError> {
        match value {
            Value::String(s) => Ok(format!("{}={}", encode_component(key), encode_component(s))),
            other => {
                let json = serde_json::to_string(other).map_err(|e| EncodeError::Serialize {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(format!(
                    "{}{}={}",
                    encode_component(key),
                    B64_JSON_SUFFIX,
                    encode_component(&BASE64.encode(json.as_bytes()))
                ))
            }
        }
    }
}

impl RequestEncoder for B64JsonEncoder {
    fn kind(&self) -> EncodingKind {
        EncodingKind::B64Json
    }

    fn encode(&self, path: &str, args: &Args, request_id: &str) -> Result<String, EncodeError> {
        let pairs = match args {
            Args::None => Vec::new(),
            Args::Named(pairs) => pairs.clone(),
            Args::Positional(_) => {
                return Err(EncodeError::PositionalUnsupported { strategy: "b64Json" })
            }
        };
        check_reserved(args, &self.callback_key)?;
        // The decoder reads any `*_b64json` key as a wrapped value
        if let Some((key, _)) = pairs.iter().find(|(key, _)| key.ends_with(B64_JSON_SUFFIX)) {
            return Err(EncodeError::ReservedKey(key.clone()));
        }

        let mut parts = Vec::with_capacity(pairs.len() + 1);
        for (key, value) in &pairs {
            parts.push(Self::encode_pair(key, value)?);
        }
        parts.push(format!(
            "{}={}",
            encode_component(&self.callback_key),
            encode_component(request_id)
        ));

        Ok(join_query(&self.base_url, path, &parts.join("&")))
    }

    fn decode(&self, url: &str) -> Result<DecodedRequest, DecodeError> {
        let (path, query) = split_url(url)?;
        let mut pairs = Vec::new();
        let mut callback = None;

        for segment in query.as_deref().unwrap_or("").split('&') {
            if segment.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = decode_component(raw_key)?;
            let value = decode_component(raw_value)?;

            if key == self.callback_key {
                callback = Some(value);
            } else if let Some(stripped) = key.strip_suffix(B64_JSON_SUFFIX) {
                let bytes = BASE64
                    .decode(value.as_bytes())
                    .map_err(|e| DecodeError::InvalidB64Json {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
                let json: Value =
                    serde_json::from_slice(&bytes).map_err(|e| DecodeError::InvalidB64Json {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
                pairs.push((stripped.to_string(), json));
            } else {
                pairs.push((key, Value::String(value)));
            }
        }

        let args = if pairs.is_empty() {
            Args::None
        } else {
            Args::Named(pairs)
        };
        Ok(DecodedRequest {
            path,
            args,
            callback,
        })
    }
}

// ============================================
// JSON QUERY (whole mapping, callback inside)
// ============================================

pub struct JsonQueryEncoder {
    base_url: String,
    callback_key: String,
}

impl JsonQueryEncoder {
    pub fn new(base_url: &str, callback_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            callback_key: callback_key.to_string(),
        }
    }
}

impl RequestEncoder for JsonQueryEncoder {
    fn kind(&self) -> EncodingKind {
        EncodingKind::JsonQuery
    }

    fn encode(&self, path: &str, args: &Args, request_id: &str) -> Result<String, EncodeError> {
        let mut object = match args {
            Args::None => Map::new(),
            Args::Named(pairs) => pairs.iter().cloned().collect(),
            Args::Positional(_) => {
                return Err(EncodeError::PositionalUnsupported {
                    strategy: "jsonQuery",
                })
            }
        };
        check_reserved(args, &self.callback_key)?;
        object.insert(
            self.callback_key.clone(),
            Value::String(request_id.to_string()),
        );

        let json = serde_json::to_string(&Value::Object(object)).map_err(|e| {
            EncodeError::Serialize {
                key: self.callback_key.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(join_query(&self.base_url, path, &encode_component(&json)))
    }

    fn decode(&self, url: &str) -> Result<DecodedRequest, DecodeError> {
        let (path, query) = split_url(url)?;

        // Pre-existing `a=b` segments of the resource path are not part of the payload
        let Some(segment) = payload_segment(query.as_deref()) else {
            return Err(DecodeError::InvalidQuery(format!(
                "no JSON object in query of {}",
                path
            )));
        };
        let mut object = match serde_json::from_str::<Value>(&decode_component(segment)?) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(DecodeError::InvalidQuery(format!(
                    "expected a JSON object of parameters, got {}",
                    other
                )))
            }
            Err(e) => return Err(DecodeError::InvalidQuery(e.to_string())),
        };

        let callback = match object.remove(&self.callback_key) {
            Some(Value::String(id)) => Some(id),
            Some(other) => Some(other.to_string()),
            None => None,
        };
        let args = if object.is_empty() {
            Args::None
        } else {
            Args::Named(object.into_iter().collect())
        };

        Ok(DecodedRequest {
            path,
            args,
            callback,
        })
    }
}

// ============================================
// ARGS ARRAY (positional, no callback)
// ============================================

pub struct ArgsArrayEncoder {
    base_url: String,
}

impl ArgsArrayEncoder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

impl RequestEncoder for ArgsArrayEncoder {
    fn kind(&self) -> EncodingKind {
        EncodingKind::ArgsArray
    }

    fn encode(&self, path: &str, args: &Args, _request_id: &str) -> Result<String, EncodeError> {
        if args.is_empty() {
            return Ok(join_query(&self.base_url, path, ""));
        }
        let values = Value::Array(args.clone().into_values());
        let json = serde_json::to_string(&values).map_err(|e| EncodeError::Serialize {
            key: "args".to_string(),
            reason: e.to_string(),
        })?;
        Ok(join_query(&self.base_url, path, &encode_component(&json)))
    }

    fn decode(&self, url: &str) -> Result<DecodedRequest, DecodeError> {
        let (path, query) = split_url(url)?;
        let args = match payload_segment(query.as_deref()) {
            None => Args::None,
            Some(raw) => {
                let decoded = decode_component(raw)?;
                match serde_json::from_str::<Value>(&decoded) {
                    Ok(Value::Array(values)) => Args::Positional(values),
                    Ok(other) => {
                        return Err(DecodeError::InvalidQuery(format!(
                            "expected a JSON array of arguments, got {}",
                            other
                        )))
                    }
                    Err(e) => return Err(DecodeError::InvalidQuery(e.to_string())),
                }
            }
        };
        Ok(DecodedRequest {
            path,
            args,
            callback: None,
        })
    }
}

#[cfg(test)]
#[path = "encoding_tests.rs"]
mod tests;
