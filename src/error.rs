use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, warn};

/// How loudly the page should present a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Expected outcome of user action (cancel, dismiss)
    Info,
    /// Worth a retry
    Warning,
    Error,
    /// The host broke the protocol
    Critical,
}

impl ErrorSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "info",
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Critical => "critical",
        }
    }
}

/// Error value reported by the host for a failed request.
///
/// The host sends either a bare message string or a structured object. Both
/// shapes arrive through the same `error` slot of the reply, so they are
/// deserialized untagged. Fields beyond the known ones are kept in `extra`, and
/// `stacktrace`/`details` keep whatever JSON the host put there, so
/// [`HostError::to_value`] gives back what the host sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostError {
    Message(String),
    Structured {
        message: String,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        error_type: Option<String>,
        #[serde(default, rename = "errorName", skip_serializing_if = "Option::is_none")]
        error_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stacktrace: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl HostError {
    /// Normalize any JSON error value from the host.
    ///
    /// Strings and objects carrying a `message` keep their shape; everything
    /// else (numbers, arrays, objects without a message) is kept as its JSON
    /// text so nothing the host said is lost.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(message) => Self::Message(message),
            other => match serde_json::from_value::<HostError>(other.clone()) {
                Ok(host_error) => host_error,
                Err(_) => Self::Message(other.to_string()),
            },
        }
    }

    pub fn structured(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self::Structured {
            message: message.into(),
            error_type: Some(error_type.into()),
            error_name: None,
            stacktrace: None,
            details: None,
            extra: Map::new(),
        }
    }

    /// Builder for [`HostError::Structured`] errors carrying an `errorName`.
    pub fn with_error_name(self, name: impl Into<String>) -> Self {
        match self {
            Self::Message(message) => Self::Structured {
                message,
                error_type: None,
                error_name: Some(name.into()),
                stacktrace: None,
                details: None,
                extra: Map::new(),
            },
            Self::Structured {
                message,
                error_type,
                stacktrace,
                details,
                extra,
                ..
            } => Self::Structured {
                message,
                error_type,
                error_name: Some(name.into()),
                stacktrace,
                details,
                extra,
            },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Message(message) => message,
            Self::Structured { message, .. } => message,
        }
    }

    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Message(_) => None,
            Self::Structured { error_type, .. } => error_type.as_deref(),
        }
    }

    pub fn error_name(&self) -> Option<&str> {
        match self {
            Self::Message(_) => None,
            Self::Structured { error_name, .. } => error_name.as_deref(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.message().to_string()))
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{}", message),
            Self::Structured {
                message,
                error_type: Some(error_type),
                ..
            } => write!(f, "{}: {}", error_type, message),
            Self::Structured { message, .. } => write!(f, "{}", message),
        }
    }
}

/// Why a request could not be encoded into a URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("positional arguments cannot be sent with the {strategy} encoding")]
    PositionalUnsupported { strategy: &'static str },
    #[error("parameter key '{0}' is reserved by the request encoding")]
    ReservedKey(String),
    #[error("failed to serialize parameter '{key}': {reason}")]
    Serialize { key: String, reason: String },
}

/// Why the host side could not decode a request URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid request url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("parameter '{key}' is not valid base64 json: {reason}")]
    InvalidB64Json { key: String, reason: String },
}

/// Rejection reason of a bridge call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("timeout")]
    Timeout,

    #[error("canceled")]
    Canceled,

    #[error("host error: {0}")]
    Host(HostError),

    #[error("unknown resource: {path}")]
    UnknownResource { path: String },

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("failed to encode request: {0}")]
    Encode(#[from] EncodeError),

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("pending handler '{name}' was superseded by a newer request")]
    Superseded { name: String },

    #[error("'{name}' was dismissed without a value")]
    Dismissed { name: String },

    #[error("bridge was dropped before the request settled")]
    Disconnected,

    #[error("no async runtime available to schedule the request timer")]
    NoRuntime,
}

impl BridgeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout => ErrorSeverity::Warning,
            Self::Canceled => ErrorSeverity::Info,
            Self::Host(_) => ErrorSeverity::Error,
            Self::UnknownResource { .. } => ErrorSeverity::Error,
            Self::MalformedResponse { .. } => ErrorSeverity::Critical,
            Self::Encode(_) => ErrorSeverity::Error,
            Self::Transport(_) => ErrorSeverity::Error,
            Self::Superseded { .. } => ErrorSeverity::Info,
            Self::Dismissed { .. } => ErrorSeverity::Info,
            Self::Disconnected => ErrorSeverity::Warning,
            Self::NoRuntime => ErrorSeverity::Critical,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "The application did not answer in time".to_string(),
            Self::Canceled => "Request canceled".to_string(),
            Self::Host(host_error) => host_error.message().to_string(),
            Self::UnknownResource { path } => format!("Unsupported request: {}", path),
            Self::MalformedResponse { .. } => "Unexpected response from the application".to_string(),
            Self::Encode(e) => format!("Could not send request: {}", e),
            Self::Transport(msg) => format!("Could not reach the application: {}", msg),
            Self::Superseded { .. } => "Request replaced by a newer one".to_string(),
            Self::Dismissed { .. } => "Nothing was selected".to_string(),
            Self::Disconnected => "Connection to the application was lost".to_string(),
            Self::NoRuntime => "Internal error: no async runtime".to_string(),
        }
    }

    /// True for the caller-visible reasons that are not failures of the host.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Superseded { .. } | Self::Dismissed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Log-and-continue for failures nobody is waiting on, tagged with the
/// caller's location.
///
/// ```ignore
/// use prefs_bridge::error::ResultExt;
///
/// // A fire-and-forget setter from a toggle
/// client.set("theme-name", "dark".into()).await.log_err();
/// ```
pub trait ResultExt<T> {
    /// Log at error level, return None
    fn log_err(self) -> Option<T>;
    /// Log at warn level, return None
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

/// Log the failure of a detached task and continue.
///
/// Spawned work has no caller to return the error to, so `operation` names
/// what failed in the log line.
///
/// ```ignore
/// tokio::spawn(async move {
///     log_async_err(client.set("theme-name", json!("dark")).await, "set theme-name");
/// });
/// ```
pub fn log_async_err<T, E: std::fmt::Debug>(
    result: std::result::Result<T, E>,
    operation: &str,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(operation = operation, error = ?err, "Async operation failed");
            None
        }
    }
}

/// Panic in debug builds, log at error level in release builds.
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}
