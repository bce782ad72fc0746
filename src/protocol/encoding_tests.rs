use super::*;
use serde_json::json;

fn b64() -> B64JsonEncoder {
    B64JsonEncoder::new("prefs://", "callback")
}

fn json_query() -> JsonQueryEncoder {
    JsonQueryEncoder::new("prefs://", "callback")
}

fn args_array() -> ArgsArrayEncoder {
    ArgsArrayEncoder::new("prefs://")
}

fn mixed_args() -> Args {
    Args::named([
        ("nested", json!({"a": [1, 2, {"b": null}], "flag": true})),
        ("title", json!("Größe – 日本語 ✓ & = ?")),
        ("enabled", json!(false)),
        ("nothing", Value::Null),
        ("count", json!(42)),
        ("ratio", json!(0.5)),
    ])
}

fn sorted(args: Args) -> Vec<(String, Value)> {
    let Args::Named(mut pairs) = args else {
        panic!("expected named args, got {:?}", args);
    };
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

#[test]
fn test_encode_component_matches_uri_component_rules() {
    assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
    assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    assert_eq!(encode_component("é"), "%C3%A9");
    assert_eq!(encode_component("+"), "%2B");
}

#[test]
fn test_b64_json_without_params_has_only_callback() {
    let url = b64().encode("/get/all", &Args::None, "__jp1").unwrap();
    assert_eq!(url, "prefs:///get/all?callback=__jp1");
}

#[test]
fn test_b64_json_appends_with_ampersand_when_path_has_query() {
    let args = Args::named([("q", json!("x"))]);
    let url = b64().encode("/search?page=2", &args, "__jp2").unwrap();
    assert_eq!(url, "prefs:///search?page=2&q=x&callback=__jp2");
}

#[test]
fn test_empty_existing_query_collapses() {
    let url = b64().encode("/get/all?", &Args::None, "__jp3").unwrap();
    assert_eq!(url, "prefs:///get/all?callback=__jp3");
}

#[test]
fn test_b64_json_wraps_non_string_values() {
    let args = Args::named([("data", json!({"k": "v"})), ("name", json!("plain"))]);
    let url = b64().encode("/extension/update-prefs", &args, "__jp4").unwrap();
    assert!(url.contains("data_b64json="));
    assert!(url.contains("name=plain"));
    assert!(url.ends_with("callback=__jp4"));
}

#[test]
fn test_b64_json_round_trip_keeps_types_and_unicode() {
    let encoder = b64();
    let args = mixed_args();
    let url = encoder.encode("/set", &args, "__jp5").unwrap();
    let decoded = encoder.decode(&url).unwrap();

    assert_eq!(decoded.path, "/set");
    assert_eq!(decoded.callback.as_deref(), Some("__jp5"));
    assert_eq!(sorted(decoded.args), sorted(args));
}

#[test]
fn test_json_query_round_trip_keeps_types_and_unicode() {
    let encoder = json_query();
    let args = mixed_args();
    let url = encoder.encode("/set", &args, "__jp6").unwrap();
    assert!(url.starts_with("prefs:///set?%7B"));

    let decoded = encoder.decode(&url).unwrap();
    assert_eq!(decoded.path, "/set");
    assert_eq!(decoded.callback.as_deref(), Some("__jp6"));
    assert_eq!(sorted(decoded.args), sorted(args));
}

#[test]
fn test_json_query_without_params_still_carries_callback() {
    let encoder = json_query();
    let url = encoder.encode("/get/all", &Args::None, "__jp7").unwrap();
    let decoded = encoder.decode(&url).unwrap();
    assert_eq!(decoded.args, Args::None);
    assert_eq!(decoded.callback.as_deref(), Some("__jp7"));
}

#[test]
fn test_args_array_round_trip_keeps_types_and_unicode() {
    let encoder = args_array();
    let args = Args::positional([
        json!({"nested": {"deep": [true, null]}}),
        json!("Ünïcödé 🚀"),
        json!(true),
        Value::Null,
        json!(-7),
    ]);
    let url = encoder.encode("/shortcut/update", &args, "__jp8").unwrap();
    assert!(!url.contains("callback"));

    let decoded = encoder.decode(&url).unwrap();
    assert_eq!(decoded.path, "/shortcut/update");
    assert_eq!(decoded.callback, None);
    assert_eq!(decoded.args, args);
}

#[test]
fn test_args_array_sends_named_args_in_order() {
    let args = Args::named([("property", json!("theme-name")), ("value", json!("dark"))]);
    let url = args_array().encode("/set", &args, "__jp9").unwrap();
    let decoded = args_array().decode(&url).unwrap();
    assert_eq!(
        decoded.args,
        Args::positional([json!("theme-name"), json!("dark")])
    );
}

#[test]
fn test_args_array_without_args_has_no_query() {
    let url = args_array().encode("/get/all", &Args::None, "__jp10").unwrap();
    assert_eq!(url, "prefs:///get/all");
    assert_eq!(args_array().decode(&url).unwrap().args, Args::None);
}

#[test]
fn test_positional_rejected_by_keyed_encoders() {
    let args = Args::positional([json!(1)]);
    assert!(matches!(
        b64().encode("/x", &args, "__jp11"),
        Err(EncodeError::PositionalUnsupported { .. })
    ));
    assert!(matches!(
        json_query().encode("/x", &args, "__jp11"),
        Err(EncodeError::PositionalUnsupported { .. })
    ));
}

#[test]
fn test_callback_key_is_reserved() {
    let args = Args::named([("callback", json!("mine"))]);
    assert_eq!(
        b64().encode("/x", &args, "__jp12"),
        Err(EncodeError::ReservedKey("callback".to_string()))
    );
}

#[test]
fn test_decode_collapses_null_host_artefact() {
    let decoded = args_array().decode("prefs:///null/get/all").unwrap();
    assert_eq!(decoded.path, "/get/all");
    let decoded = args_array().decode("prefs://null/get/all").unwrap();
    assert_eq!(decoded.path, "/get/all");
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(matches!(
        args_array().decode("not a url"),
        Err(DecodeError::InvalidUrl { .. })
    ));
    assert!(matches!(
        args_array().decode("prefs:///set?%7Bnot-json"),
        Err(DecodeError::InvalidQuery(_))
    ));
    assert!(matches!(
        b64().decode("prefs:///set?data_b64json=%%%"),
        Err(_)
    ));
}

#[test]
fn test_encoder_for_follows_config() {
    let config = BridgeConfig::script_tag();
    assert_eq!(encoder_for(&config).kind(), EncodingKind::JsonQuery);
    let config = BridgeConfig::fetch().with_encoding(EncodingKind::B64Json);
    assert_eq!(encoder_for(&config).kind(), EncodingKind::B64Json);
}

#[test]
fn test_args_array_round_trip_after_existing_path_query() {
    let encoder = args_array();
    let args = Args::positional([json!("theme-name"), json!(true)]);
    let url = encoder.encode("/search?page=2", &args, "__jp13").unwrap();
    assert_eq!(
        url,
        "prefs:///search?page=2&%5B%22theme-name%22%2Ctrue%5D"
    );

    let decoded = encoder.decode(&url).unwrap();
    assert_eq!(decoded.path, "/search");
    assert_eq!(decoded.args, args);
}

#[test]
fn test_args_array_path_query_alone_is_no_args() {
    let decoded = args_array().decode("prefs:///search?page=2").unwrap();
    assert_eq!(decoded.args, Args::None);
}

#[test]
fn test_json_query_round_trip_after_existing_path_query() {
    let encoder = json_query();
    let args = Args::named([("q", json!("a&b=c"))]);
    let url = encoder.encode("/search?page=2", &args, "__jp14").unwrap();

    let decoded = encoder.decode(&url).unwrap();
    assert_eq!(decoded.args, args);
    assert_eq!(decoded.callback.as_deref(), Some("__jp14"));
}

#[test]
fn test_json_query_reports_corrupt_percent_encoding() {
    let result = json_query().decode("prefs:///set?%7B%FF%FE%7D");
    assert!(
        matches!(&result, Err(DecodeError::InvalidQuery(reason)) if !reason.contains("no JSON object")),
        "{:?}",
        result
    );
}

#[test]
fn test_b64_json_rejects_caller_keys_with_wrapper_suffix() {
    let args = Args::named([("icon_b64json", json!("plain text"))]);
    assert_eq!(
        b64().encode("/x", &args, "__jp15"),
        Err(EncodeError::ReservedKey("icon_b64json".to_string()))
    );
}
