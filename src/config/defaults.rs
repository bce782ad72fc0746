//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Prefix of generated request ids (`__jp1`, `__jp2`, ...)
pub const DEFAULT_CALLBACK_PREFIX: &str = "__jp";

/// Reserved query key carrying the request id
pub const DEFAULT_CALLBACK_KEY: &str = "callback";

/// Scheme the embedded webview routes to the host
pub const DEFAULT_BASE_URL: &str = "prefs://";

/// Timeout applied to script-tag requests when none is configured
pub const DEFAULT_SCRIPT_TAG_TIMEOUT_MS: u64 = 15_000;

/// Suffix marking a base64-wrapped JSON parameter
pub const B64_JSON_SUFFIX: &str = "_b64json";

/// Config file name under the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.json";
