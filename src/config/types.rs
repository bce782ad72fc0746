//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

// ============================================
// STRATEGIES
// ============================================

/// How an encoded request reaches the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportKind {
    /// Insert a script element whose `src` is the request URL; the host answers
    /// by invoking the page-global callback named after the request id.
    ScriptTag,
    /// Issue a fetch and read a `[payload, error]` body.
    #[default]
    Fetch,
}

/// How call arguments are laid out in the request URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncodingKind {
    /// `key=value` pairs; object values as `<key>_b64json=<base64 json>`
    B64Json,
    /// The whole parameter mapping, callback included, as one JSON query
    JsonQuery,
    /// Positional arguments as one JSON array, no callback id on the wire
    #[default]
    ArgsArray,
}

/// When a push notification settles a named pending handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PushSettlement {
    Immediate,
    /// Settle one scheduling tick after the push arrives
    #[default]
    NextTick,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the {encoding:?} encoding carries no callback id and cannot be used with the {transport:?} transport")]
    IncompatibleStrategies {
        transport: TransportKind,
        encoding: EncodingKind,
    },
    #[error("callbackPrefix must not be empty")]
    EmptyCallbackPrefix,
    #[error("callbackKey must not be empty")]
    EmptyCallbackKey,
    #[error("config selects the {configured:?} transport but a {actual:?} transport was supplied")]
    TransportMismatch {
        configured: TransportKind,
        actual: TransportKind,
    },
}

// ============================================
// BRIDGE CONFIG
// ============================================

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default)]
    pub encoding: EncodingKind,
    /// Request timeout in milliseconds. When absent, script-tag requests use
    /// 15000 and fetch requests rely on the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_callback_prefix")]
    pub callback_prefix: String,
    #[serde(default = "default_callback_key")]
    pub callback_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub push_settlement: PushSettlement,
}

fn default_callback_prefix() -> String {
    DEFAULT_CALLBACK_PREFIX.to_string()
}
fn default_callback_key() -> String {
    DEFAULT_CALLBACK_KEY.to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            transport: TransportKind::default(),
            encoding: EncodingKind::default(),
            timeout_ms: None,
            callback_prefix: default_callback_prefix(),
            callback_key: default_callback_key(),
            base_url: default_base_url(),
            push_settlement: PushSettlement::default(),
        }
    }
}

impl BridgeConfig {
    /// The first-generation setup: script tags with a JSON query carrying the callback.
    pub fn script_tag() -> Self {
        BridgeConfig {
            transport: TransportKind::ScriptTag,
            encoding: EncodingKind::JsonQuery,
            ..Default::default()
        }
    }

    /// The fetch setup with positional arguments.
    pub fn fetch() -> Self {
        BridgeConfig::default()
    }

    pub fn with_encoding(mut self, encoding: EncodingKind) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_push_settlement(mut self, push_settlement: PushSettlement) -> Self {
        self.push_settlement = push_settlement;
        self
    }

    /// Effective timeout for a call without a per-call override.
    pub fn effective_timeout(&self) -> Option<Duration> {
        match (self.timeout_ms, self.transport) {
            (Some(ms), _) => Some(Duration::from_millis(ms)),
            (None, TransportKind::ScriptTag) => {
                Some(Duration::from_millis(DEFAULT_SCRIPT_TAG_TIMEOUT_MS))
            }
            (None, TransportKind::Fetch) => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.callback_prefix.is_empty() {
            return Err(ConfigError::EmptyCallbackPrefix);
        }
        if self.callback_key.is_empty() {
            return Err(ConfigError::EmptyCallbackKey);
        }
        if self.transport == TransportKind::ScriptTag && self.encoding == EncodingKind::ArgsArray {
            return Err(ConfigError::IncompatibleStrategies {
                transport: self.transport,
                encoding: self.encoding,
            });
        }
        Ok(())
    }
}
