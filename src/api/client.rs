//! Typed wrappers over the bridge's `call()` for every preferences resource.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use super::types::{Extension, FileKind, Settings, Shortcut, ShortcutDraft, UpdateCheck};
use crate::bridge::Bridge;
use crate::config::EncodingKind;
use crate::error::{log_async_err, BridgeError, Result, ResultExt};
use crate::protocol::{Args, HotkeyCapture};

/// Property under which `/set` stores the autostart toggle
const AUTOSTART_PROPERTY: &str = "autostart-enabled";

#[derive(Clone)]
pub struct PrefsClient {
    bridge: Bridge,
}

impl PrefsClient {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    // ============================================
    // SETTINGS
    // ============================================

    pub async fn get_all(&self) -> Result<Settings> {
        let value = self.bridge.call("/get/all", Args::None).await?;
        typed("/get/all", value)
    }

    pub async fn set(&self, property: &str, value: Value) -> Result<()> {
        let args = Args::named([("property", json!(property)), ("value", value)]);
        self.bridge.call("/set", args).await.map(drop)
    }

    /// Fire-and-forget `/set` for toggles that do not wait on the host.
    /// Failures are logged. Returns None outside a runtime.
    pub fn set_detached(&self, property: &str, value: Value) -> Option<JoinHandle<()>> {
        let handle = Handle::try_current()
            .map_err(|_| BridgeError::NoRuntime)
            .log_err()?;
        let client = self.clone();
        let property = property.to_string();
        Some(handle.spawn(async move {
            let result = client.set(&property, value).await;
            log_async_err(result, &format!("set {}", property));
        }))
    }

    pub async fn set_hotkey_show_app(&self, hotkey: &str) -> Result<()> {
        let args = Args::named([("value", json!(hotkey))]);
        self.bridge.call("/set/hotkey-show-app", args).await.map(drop)
    }

    pub async fn set_autostart(&self, enabled: bool) -> Result<()> {
        self.set(AUTOSTART_PROPERTY, json!(enabled)).await
    }

    pub async fn open_web_url(&self, url: &str) -> Result<()> {
        let args = Args::named([("url", json!(url))]);
        self.bridge.call("/open/web-url", args).await.map(drop)
    }

    pub async fn open_extensions_dir(&self) -> Result<()> {
        self.bridge
            .call("/open/extensions-dir", Args::None)
            .await
            .map(drop)
    }

    // ============================================
    // DIALOGS (answered by a push)
    // ============================================

    /// Open the host's hotkey dialog; settles when the user presses a combination.
    pub async fn show_hotkey_dialog(&self, name: &str) -> Result<HotkeyCapture> {
        let args = Args::named([("name", json!(name))]);
        let value = self
            .bridge
            .call_named(name, "/show/hotkey-dialog", args)
            .await?;
        typed("/show/hotkey-dialog", value)
    }

    /// Open the host's file browser; settles with the selected path, or
    /// rejects with `Dismissed` when the user closes it.
    pub async fn show_file_browser(&self, name: &str, kind: FileKind) -> Result<String> {
        let args = Args::named([("type", json!(kind.as_str())), ("name", json!(name))]);
        let value = self
            .bridge
            .call_named(name, "/show/file-browser", args)
            .await?;
        typed("/show/file-browser", value)
    }

    // ============================================
    // SHORTCUTS
    // ============================================

    pub async fn get_shortcuts(&self) -> Result<Vec<Shortcut>> {
        let value = self.bridge.call("/shortcut/get-all", Args::None).await?;
        typed("/shortcut/get-all", value)
    }

    /// Store a new shortcut; resolves with it, including the id the host assigned.
    pub async fn add_shortcut(&self, draft: &ShortcutDraft) -> Result<Shortcut> {
        let value = self
            .bridge
            .call("/shortcut/add", self.record(draft)?)
            .await?;
        typed("/shortcut/add", value)
    }

    pub async fn update_shortcut(&self, shortcut: &Shortcut) -> Result<Shortcut> {
        let value = self
            .bridge
            .call("/shortcut/update", self.record(shortcut)?)
            .await?;
        typed("/shortcut/update", value)
    }

    pub async fn remove_shortcut(&self, id: &str) -> Result<()> {
        let args = Args::named([("id", json!(id))]);
        self.bridge.call("/shortcut/remove", args).await.map(drop)
    }

    // ============================================
    // EXTENSIONS
    // ============================================

    pub async fn get_extensions(&self) -> Result<Vec<Extension>> {
        let value = self.bridge.call("/extension/get-all", Args::None).await?;
        typed("/extension/get-all", value)
    }

    pub async fn add_extension(&self, url: &str) -> Result<Extension> {
        let args = Args::named([("url", json!(url))]);
        let value = self.bridge.call("/extension/add", args).await?;
        typed("/extension/add", value)
    }

    pub async fn update_extension_prefs(&self, id: &str, data: Value) -> Result<()> {
        let args = Args::named([("id", json!(id)), ("data", data)]);
        self.bridge
            .call("/extension/update-prefs", args)
            .await
            .map(drop)
    }

    pub async fn check_extension_updates(&self, id: &str) -> Result<UpdateCheck> {
        let args = Args::named([("id", json!(id))]);
        let value = self.bridge.call("/extension/check-updates", args).await?;
        typed("/extension/check-updates", value)
    }

    pub async fn update_extension(&self, id: &str) -> Result<Extension> {
        let args = Args::named([("id", json!(id))]);
        let value = self.bridge.call("/extension/update-ext", args).await?;
        typed("/extension/update-ext", value)
    }

    pub async fn toggle_extension(&self, id: &str, enabled: bool) -> Result<()> {
        let args = Args::named([("id", json!(id)), ("enabled", json!(enabled))]);
        self.bridge
            .call("/extension/toggle-enabled", args)
            .await
            .map(drop)
    }

    pub async fn remove_extension(&self, id: &str) -> Result<()> {
        let args = Args::named([("id", json!(id))]);
        self.bridge.call("/extension/remove", args).await.map(drop)
    }

    /// A record travels as flat keyed params, or as one object in an args array.
    fn record<T: Serialize>(&self, record: &T) -> Result<Args> {
        let value = serde_json::to_value(record).map_err(|e| {
            BridgeError::Encode(crate::error::EncodeError::Serialize {
                key: "record".to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(match self.bridge.config().encoding {
            EncodingKind::ArgsArray => Args::positional([value]),
            EncodingKind::B64Json | EncodingKind::JsonQuery => Args::from(value),
        })
    }
}

fn typed<T: DeserializeOwned>(path: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        warn!(path, error = %e, "Host payload does not match the expected shape");
        BridgeError::malformed(format!("{}: {}", path, e))
    })
}
