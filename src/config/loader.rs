//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::CONFIG_FILE_NAME;
use super::types::BridgeConfig;

/// Default location: `<config dir>/prefs-bridge/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("prefs-bridge")
        .join(CONFIG_FILE_NAME)
}

/// Load configuration from a JSON file.
///
/// Returns `BridgeConfig::default()` if the file is missing, unreadable,
/// unparsable or describes an invalid strategy combination.
#[instrument(name = "load_config", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> BridgeConfig {
    if !path.exists() {
        info!("Config file not found, using defaults");
        return BridgeConfig::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "Failed to read config file, using defaults");
            return BridgeConfig::default();
        }
    };

    let config = match serde_json::from_str::<BridgeConfig>(&content) {
        Ok(config) => config,
        Err(e) => {
            let error_hint = if e.to_string().contains("unknown variant") {
                "\n\nHint: transport is one of \"scriptTag\" | \"fetch\", \
                encoding is one of \"b64Json\" | \"jsonQuery\" | \"argsArray\""
            } else {
                ""
            };
            warn!(
                error = %e,
                hint = %error_hint,
                "Failed to parse config JSON, using defaults"
            );
            return BridgeConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        warn!(error = %e, "Invalid bridge config, using defaults");
        return BridgeConfig::default();
    }

    info!(
        transport = ?config.transport,
        encoding = ?config.encoding,
        "Successfully loaded config"
    );
    config
}
