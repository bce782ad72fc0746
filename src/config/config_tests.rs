use super::*;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = BridgeConfig::default();
    assert_eq!(config.transport, TransportKind::Fetch);
    assert_eq!(config.encoding, EncodingKind::ArgsArray);
    assert_eq!(config.callback_prefix, "__jp");
    assert_eq!(config.callback_key, "callback");
    assert_eq!(config.base_url, "prefs://");
    assert_eq!(config.push_settlement, PushSettlement::NextTick);
    assert!(config.validate().is_ok());
}

#[test]
fn test_fetch_has_no_default_timeout() {
    assert_eq!(BridgeConfig::fetch().effective_timeout(), None);
}

#[test]
fn test_script_tag_defaults_to_fifteen_seconds() {
    assert_eq!(
        BridgeConfig::script_tag().effective_timeout(),
        Some(Duration::from_millis(DEFAULT_SCRIPT_TAG_TIMEOUT_MS))
    );
}

#[test]
fn test_explicit_timeout_wins() {
    let config = BridgeConfig::fetch().with_timeout(Duration::from_millis(50));
    assert_eq!(config.effective_timeout(), Some(Duration::from_millis(50)));
}

#[test]
fn test_args_array_rejected_for_script_tag() {
    let config = BridgeConfig::script_tag().with_encoding(EncodingKind::ArgsArray);
    assert_eq!(
        config.validate(),
        Err(ConfigError::IncompatibleStrategies {
            transport: TransportKind::ScriptTag,
            encoding: EncodingKind::ArgsArray,
        })
    );
}

#[test]
fn test_empty_callback_key_rejected() {
    let config = BridgeConfig {
        callback_key: String::new(),
        ..Default::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::EmptyCallbackKey));
}

#[test]
fn test_config_deserialization_camel_case() {
    let json = r#"{
        "transport": "scriptTag",
        "encoding": "b64Json",
        "timeoutMs": 2500,
        "pushSettlement": "immediate"
    }"#;
    let config: BridgeConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.transport, TransportKind::ScriptTag);
    assert_eq!(config.encoding, EncodingKind::B64Json);
    assert_eq!(config.timeout_ms, Some(2500));
    assert_eq!(config.push_settlement, PushSettlement::Immediate);
    // Unspecified fields fall back to defaults
    assert_eq!(config.callback_prefix, DEFAULT_CALLBACK_PREFIX);
}

#[test]
fn test_config_serialization_skips_absent_timeout() {
    let json = serde_json::to_string(&BridgeConfig::default()).unwrap();
    assert!(!json.contains("timeoutMs"));
    assert!(json.contains("\"transport\":\"fetch\""));
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&dir.path().join("nope.json"));
    assert_eq!(config.transport, TransportKind::Fetch);
}

#[test]
fn test_load_valid_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"transport": "scriptTag", "encoding": "jsonQuery"}}"#).unwrap();
    let config = load_config(file.path());
    assert_eq!(config.transport, TransportKind::ScriptTag);
    assert_eq!(config.encoding, EncodingKind::JsonQuery);
}

#[test]
fn test_load_invalid_json_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"transport": "carrierPigeon"}}"#).unwrap();
    let config = load_config(file.path());
    assert_eq!(config.transport, TransportKind::Fetch);
}

#[test]
fn test_load_incompatible_combination_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"transport": "scriptTag", "encoding": "argsArray"}}"#).unwrap();
    let config = load_config(file.path());
    assert_eq!(config.transport, TransportKind::Fetch);
    assert_eq!(config.encoding, EncodingKind::ArgsArray);
}

#[test]
fn test_default_config_path_file_name() {
    assert!(default_config_path().ends_with("prefs-bridge/config.json"));
}
