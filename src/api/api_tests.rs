use super::*;
use crate::bridge::{Bridge, MemoryDocument};
use crate::config::{BridgeConfig, EncodingKind};
use crate::error::BridgeError;
use crate::host::{preferences_router, HostRouter, MockHost};
use crate::logging;
use crate::protocol::{HotkeyCapture, FILE_SELECT_EVENT, HOTKEY_CAPTURED_EVENT};
use serde_json::{json, Value};
use std::sync::Arc;

fn fetch_client(encoding: EncodingKind) -> (PrefsClient, MockHost) {
    logging::init_for_tests();
    let config = BridgeConfig::fetch().with_encoding(encoding);
    let host = MockHost::new(preferences_router(), &config);
    let bridge = Bridge::fetch(config, Arc::new(host.clone())).unwrap();
    host.connect(bridge.endpoint());
    (PrefsClient::new(bridge), host)
}

fn script_client() -> (PrefsClient, MockHost) {
    logging::init_for_tests();
    let config = BridgeConfig::script_tag();
    let document = Arc::new(MemoryDocument::new());
    let host = MockHost::new(preferences_router(), &config);
    let bridge = Bridge::script_tag(config, document.clone()).unwrap();
    host.connect(bridge.endpoint());
    tokio::spawn(host.clone().serve_scripts(document.requests()));
    (PrefsClient::new(bridge), host)
}

const ENCODINGS: [EncodingKind; 3] = [
    EncodingKind::B64Json,
    EncodingKind::JsonQuery,
    EncodingKind::ArgsArray,
];

#[tokio::test]
async fn test_get_all_parses_settings_and_env() {
    let (client, _host) = fetch_client(EncodingKind::ArgsArray);
    let settings = client.get_all().await.unwrap();

    assert_eq!(settings.hotkey_show_app, "<Primary>space");
    assert!(settings.show_indicator_icon);
    assert_eq!(settings.theme_name, "light");
    assert_eq!(
        settings.blacklisted_dirs(),
        vec!["/usr/share/locale", "/usr/share/app-install"]
    );
    assert_eq!(settings.env.api_version, "2.0");
    assert!(settings.extra.is_empty());
}

#[tokio::test]
async fn test_settings_round_trip_for_every_encoding() {
    for encoding in ENCODINGS {
        let (client, _host) = fetch_client(encoding);
        client.set("theme-name", json!("dark")).await.unwrap();
        client.set("grid-columns", json!(4)).await.unwrap();
        client.set_autostart(true).await.unwrap();
        client.set_hotkey_show_app("<Alt>F1").await.unwrap();

        let settings = client.get_all().await.unwrap();
        assert_eq!(settings.theme_name, "dark", "{:?}", encoding);
        assert!(settings.autostart_enabled);
        assert_eq!(settings.hotkey_show_app, "<Alt>F1");
        assert_eq!(settings.extra.get("grid-columns"), Some(&json!(4)));
    }
}

#[tokio::test]
async fn test_detached_set_applies_without_awaiting_the_call() {
    let (client, _host) = fetch_client(EncodingKind::ArgsArray);
    let task = client
        .set_detached("theme-name", json!("dark"))
        .expect("inside a runtime");
    task.await.unwrap();

    assert_eq!(client.get_all().await.unwrap().theme_name, "dark");
}

#[tokio::test]
async fn test_detached_set_swallows_host_errors() {
    let (client, _host) = fetch_client(EncodingKind::ArgsArray);
    // The host rejects a /set without a property; the task still completes
    let task = client.set_detached("", Value::Null).expect("inside a runtime");
    task.await.unwrap();
    assert_eq!(client.bridge().pending_count(), 0);
}

#[test]
fn test_detached_set_outside_runtime_is_none() {
    let (client, _host) = fetch_client(EncodingKind::ArgsArray);
    assert!(client.set_detached("theme-name", json!("dark")).is_none());
}

#[tokio::test]
async fn test_shortcut_crud_for_every_encoding() {
    for encoding in ENCODINGS {
        let (client, _host) = fetch_client(encoding);
        let draft = ShortcutDraft::new("Wikipedia", "wiki", "https://en.wikipedia.org/wiki/%s");

        let mut added = client.add_shortcut(&draft).await.unwrap();
        assert_eq!(added.id, "new-id-1", "{:?}", encoding);
        assert_eq!(added.cmd, draft.cmd);

        added.keyword = "w".to_string();
        let updated = client.update_shortcut(&added).await.unwrap();
        assert_eq!(updated.keyword, "w");

        let all = client.get_shortcuts().await.unwrap();
        assert_eq!(all.len(), 2);

        client.remove_shortcut(&added.id).await.unwrap();
        let all = client.get_shortcuts().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "google-search");
    }
}

#[tokio::test]
async fn test_extension_operations() {
    let (client, _host) = fetch_client(EncodingKind::B64Json);
    let ext = client
        .add_extension("https://github.com/someone/ulauncher-emoji")
        .await
        .unwrap();
    assert_eq!(ext.id, "com.example.ulauncher-emoji");

    client
        .update_extension_prefs(&ext.id, json!({"keyword": {"value": "em"}}))
        .await
        .unwrap();
    client.toggle_extension(&ext.id, false).await.unwrap();

    let check = client.check_extension_updates(&ext.id).await.unwrap();
    assert!(!check.has_update);
    let updated = client.update_extension(&ext.id).await.unwrap();
    assert!(updated.updated_at.is_some());

    let all = client.get_extensions().await.unwrap();
    let stored = all.iter().find(|e| e.id == ext.id).unwrap();
    assert!(!stored.is_enabled);
    assert_eq!(stored.preferences, json!({"keyword": {"value": "em"}}));

    client.remove_extension(&ext.id).await.unwrap();
    assert_eq!(client.get_extensions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_host_errors_surface_verbatim() {
    let (client, _host) = fetch_client(EncodingKind::JsonQuery);
    let err = client.remove_extension("missing").await.unwrap_err();
    assert_eq!(err.user_message(), "No extension with id 'missing'");

    let err = client.open_web_url("not-a-url").await.unwrap_err();
    assert!(matches!(err, BridgeError::Host(_)));
    client.open_web_url("https://ulauncher.io").await.unwrap();
    client.open_extensions_dir().await.unwrap();
}

#[tokio::test]
async fn test_file_browser_resolves_with_path() {
    let (client, host) = fetch_client(EncodingKind::ArgsArray);
    let picker = tokio::spawn({
        let client = client.clone();
        async move { client.show_file_browser("icon", FileKind::Image).await }
    });
    while !client.bridge().has_named_handler("icon") {
        tokio::task::yield_now().await;
    }

    host.notify(FILE_SELECT_EVENT, json!({"name": "icon", "path": "/home/user/icon.png"}));
    assert_eq!(picker.await.unwrap(), Ok("/home/user/icon.png".to_string()));
}

#[tokio::test]
async fn test_file_browser_dismissed() {
    let (client, host) = fetch_client(EncodingKind::ArgsArray);
    let picker = tokio::spawn({
        let client = client.clone();
        async move { client.show_file_browser("icon", FileKind::Any).await }
    });
    while !client.bridge().has_named_handler("icon") {
        tokio::task::yield_now().await;
    }

    host.notify(FILE_SELECT_EVENT, json!({"name": "icon", "path": ""}));
    assert_eq!(
        picker.await.unwrap(),
        Err(BridgeError::Dismissed {
            name: "icon".to_string()
        })
    );
}

#[tokio::test]
async fn test_hotkey_dialog_over_script_tags_with_legacy_push() {
    let (client, host) = script_client();
    let dialog = tokio::spawn({
        let client = client.clone();
        async move { client.show_hotkey_dialog("hotkey-show-app").await }
    });
    while !client.bridge().has_named_handler("hotkey-show-app") {
        tokio::task::yield_now().await;
    }

    host.notify(
        "hotkey-show-app",
        json!({"value": "<Primary><Alt>k", "displayValue": "Ctrl+Alt+K"}),
    );
    assert_eq!(
        dialog.await.unwrap(),
        Ok(HotkeyCapture {
            value: "<Primary><Alt>k".to_string(),
            display_value: "Ctrl+Alt+K".to_string(),
        })
    );
}

#[tokio::test]
async fn test_hotkey_dialog_with_unified_push() {
    let (client, host) = fetch_client(EncodingKind::ArgsArray);
    let dialog = tokio::spawn({
        let client = client.clone();
        async move { client.show_hotkey_dialog("hotkey-show-app").await }
    });
    while !client.bridge().has_named_handler("hotkey-show-app") {
        tokio::task::yield_now().await;
    }

    host.notify(
        HOTKEY_CAPTURED_EVENT,
        json!({"name": "hotkey-show-app", "value": "<Super>space", "displayValue": "Super+Space"}),
    );
    let capture = dialog.await.unwrap().unwrap();
    assert_eq!(capture.display_value, "Super+Space");
}

#[tokio::test]
async fn test_unexpected_payload_shape_is_malformed() {
    logging::init_for_tests();
    let config = BridgeConfig::fetch();
    let mut router = HostRouter::new();
    router
        .route("/shortcut/get-all", |_| Ok(json!({"not": "a list"})))
        .unwrap();
    let host = MockHost::new(router, &config);
    let client = PrefsClient::new(Bridge::fetch(config, Arc::new(host)).unwrap());

    assert!(matches!(
        client.get_shortcuts().await,
        Err(BridgeError::MalformedResponse { .. })
    ));
}
