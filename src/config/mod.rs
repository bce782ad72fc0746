//! Configuration module - bridge strategies and wire constants
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - `BridgeConfig` and the strategy enums
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    B64_JSON_SUFFIX, DEFAULT_BASE_URL, DEFAULT_CALLBACK_KEY, DEFAULT_CALLBACK_PREFIX,
    DEFAULT_SCRIPT_TAG_TIMEOUT_MS,
};

pub use types::{BridgeConfig, ConfigError, EncodingKind, PushSettlement, TransportKind};

pub use loader::{default_config_path, load_config};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
