//! Typed values of the preferences resources

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings as returned by `/get/all`.
///
/// Keys this crate does not know about are kept in `extra` so a round trip
/// through the page never loses host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "hotkey-show-app", default)]
    pub hotkey_show_app: String,
    #[serde(rename = "show-indicator-icon", default)]
    pub show_indicator_icon: bool,
    #[serde(rename = "show-recent-apps", default)]
    pub show_recent_apps: Value,
    #[serde(rename = "clear-previous-query", default)]
    pub clear_previous_query: bool,
    #[serde(rename = "theme-name", default)]
    pub theme_name: String,
    #[serde(rename = "blacklisted-desktop-dirs", default)]
    pub blacklisted_desktop_dirs: String,
    #[serde(rename = "autostart-enabled", default)]
    pub autostart_enabled: bool,
    #[serde(default)]
    pub env: Env,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Blacklisted desktop dirs as a list (the host stores them `:`-joined).
    pub fn blacklisted_dirs(&self) -> Vec<&str> {
        self.blacklisted_desktop_dirs
            .split(':')
            .filter(|d| !d.is_empty())
            .collect()
    }
}

/// Host environment facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Env {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub user_home: String,
    #[serde(default)]
    pub autostart_allowed: bool,
    #[serde(default)]
    pub hotkey_supported: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortcut {
    pub id: String,
    pub name: String,
    pub keyword: String,
    pub cmd: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_default_search: bool,
}

/// A shortcut before the host assigned it an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutDraft {
    pub name: String,
    pub keyword: String,
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_default_search: bool,
}

impl ShortcutDraft {
    pub fn new(name: impl Into<String>, keyword: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyword: keyword.into(),
            cmd: cmd.into(),
            icon: None,
            is_default_search: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub preferences: Value,
}

/// Result of `/extension/check-updates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub has_update: bool,
    #[serde(default)]
    pub commit: Option<String>,
}

/// What the host's file browser lets the user pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Any,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Any => "any",
        }
    }
}
