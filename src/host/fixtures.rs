//! In-memory launcher back end for offline development and tests.

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::router::HostRouter;
use crate::error::HostError;
use crate::protocol::Args;

/// Version reported in the `env` block of `/get/all`
const FIXTURE_VERSION: &str = "5.15.0";
const FIXTURE_API_VERSION: &str = "2.0";

struct FixtureState {
    settings: Map<String, Value>,
    shortcuts: Vec<Map<String, Value>>,
    extensions: Vec<Map<String, Value>>,
    next_id: u64,
}

impl FixtureState {
    fn new() -> Self {
        let settings = json!({
            "hotkey-show-app": "<Primary>space",
            "show-indicator-icon": true,
            "show-recent-apps": "3",
            "clear-previous-query": true,
            "theme-name": "light",
            "blacklisted-desktop-dirs": "/usr/share/locale:/usr/share/app-install",
            "autostart-enabled": false
        });
        let extensions = json!([
            {
                "id": "com.github.ulauncher.ulauncher-timer",
                "url": "https://github.com/Ulauncher/ulauncher-timer",
                "name": "Timer",
                "is_enabled": true,
                "updated_at": "2026-03-01T10:00:00",
                "preferences": {"keyword": {"type": "keyword", "value": "ti"}}
            }
        ]);

        Self {
            settings: settings.as_object().cloned().unwrap_or_default(),
            shortcuts: vec![object(json!({
                "id": "google-search",
                "name": "Google Search",
                "keyword": "g",
                "cmd": "https://google.com/search?q=%s",
                "icon": null,
                "is_default_search": true
            }))],
            extensions: extensions
                .as_array()
                .map(|items| items.iter().cloned().map(object).collect())
                .unwrap_or_default(),
            next_id: 1,
        }
    }

    fn generate_id(&mut self) -> String {
        let id = format!("new-id-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn extension_mut(&mut self, id: &str) -> Result<&mut Map<String, Value>, HostError> {
        self.extensions
            .iter_mut()
            .find(|ext| ext.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| not_found("extension", id))
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn not_found(kind: &str, id: &str) -> HostError {
    HostError::structured(format!("No {} with id '{}'", kind, id), "LookupError")
}

fn invalid(message: impl Into<String>) -> HostError {
    HostError::structured(message, "ValueError")
}

/// A record argument: flat named args, or one positional object.
fn record(args: &Args) -> Result<Map<String, Value>, HostError> {
    match args {
        Args::Named(pairs) => Ok(pairs.iter().cloned().collect()),
        Args::Positional(values) => match values.first() {
            Some(Value::Object(map)) => Ok(map.clone()),
            _ => Err(invalid("expected an object argument")),
        },
        Args::None => Err(invalid("missing record argument")),
    }
}

fn required_str<'a>(args: &'a Args, key: &str, index: usize) -> Result<&'a str, HostError> {
    args.get_or_at(key, index)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(format!("missing argument '{}'", key)))
}

fn required<'a>(args: &'a Args, key: &str, index: usize) -> Result<&'a Value, HostError> {
    args.get_or_at(key, index)
        .ok_or_else(|| invalid(format!("missing argument '{}'", key)))
}

/// Router answering every preferences route from in-memory state.
pub fn preferences_router() -> HostRouter {
    let state = Arc::new(Mutex::new(FixtureState::new()));
    let mut router = HostRouter::new();
    if let Err(e) = register_routes(&mut router, &state) {
        crate::debug_panic!("fixture routes failed to register: {}", e);
    }
    router
}

fn register_routes(
    router: &mut HostRouter,
    state: &Arc<Mutex<FixtureState>>,
) -> Result<(), super::router::RouteError> {
    // ---- settings ----
    let s = Arc::clone(state);
    router.route("/get/all", move |_| {
        let state = s.lock();
        let mut all = state.settings.clone();
        all.insert(
            "env".to_string(),
            json!({
                "version": FIXTURE_VERSION,
                "api_version": FIXTURE_API_VERSION,
                "user_home": "/home/user",
                "autostart_allowed": true,
                "hotkey_supported": true
            }),
        );
        Ok(Value::Object(all))
    })?;

    let s = Arc::clone(state);
    router.route("/set", move |args| {
        let property = required_str(args, "property", 0)?;
        let value = required(args, "value", 1)?.clone();
        debug!(property, "Fixture setting updated");
        s.lock().settings.insert(property.to_string(), value);
        Ok(Value::Null)
    })?;

    let s = Arc::clone(state);
    router.route("/set/hotkey-show-app", move |args| {
        let value = required_str(args, "value", 0)?;
        s.lock()
            .settings
            .insert("hotkey-show-app".to_string(), Value::String(value.to_string()));
        Ok(Value::Null)
    })?;

    // ---- dialogs and desktop integration: acknowledged, answered later by a push ----
    router.route("/show/hotkey-dialog", |args| {
        required_str(args, "name", 0)?;
        Ok(Value::Null)
    })?;
    router.route("/show/file-browser", |args| {
        required_str(args, "type", 0)?;
        required_str(args, "name", 1)?;
        Ok(Value::Null)
    })?;
    router.route("/open/web-url", |args| {
        let url = required_str(args, "url", 0)?;
        if !url.contains("://") {
            return Err(invalid(format!("not a web url: {}", url)));
        }
        Ok(Value::Null)
    })?;
    router.route("/open/extensions-dir", |_| Ok(Value::Null))?;

    // ---- shortcuts ----
    let s = Arc::clone(state);
    router.route("/shortcut/get-all", move |_| {
        let shortcuts = s.lock().shortcuts.iter().cloned().map(Value::Object).collect();
        Ok(Value::Array(shortcuts))
    })?;

    let s = Arc::clone(state);
    router.route("/shortcut/add", move |args| {
        let mut shortcut = record(args)?;
        let mut state = s.lock();
        let id = state.generate_id();
        shortcut.insert("id".to_string(), Value::String(id));
        state.shortcuts.push(shortcut.clone());
        Ok(Value::Object(shortcut))
    })?;

    let s = Arc::clone(state);
    router.route("/shortcut/update", move |args| {
        let shortcut = record(args)?;
        let id = shortcut
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("shortcut has no id"))?
            .to_string();
        let mut state = s.lock();
        let existing = state
            .shortcuts
            .iter_mut()
            .find(|sc| sc.get("id").and_then(Value::as_str) == Some(id.as_str()))
            .ok_or_else(|| not_found("shortcut", &id))?;
        existing.extend(shortcut);
        Ok(Value::Object(existing.clone()))
    })?;

    let s = Arc::clone(state);
    router.route("/shortcut/remove", move |args| {
        let id = required_str(args, "id", 0)?;
        let mut state = s.lock();
        let before = state.shortcuts.len();
        state
            .shortcuts
            .retain(|sc| sc.get("id").and_then(Value::as_str) != Some(id));
        if state.shortcuts.len() == before {
            return Err(not_found("shortcut", id));
        }
        Ok(Value::Null)
    })?;

    // ---- extensions ----
    let s = Arc::clone(state);
    router.route("/extension/get-all", move |_| {
        let extensions = s.lock().extensions.iter().cloned().map(Value::Object).collect();
        Ok(Value::Array(extensions))
    })?;

    let s = Arc::clone(state);
    router.route("/extension/add", move |args| {
        let url = required_str(args, "url", 0)?;
        let name = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid(format!("cannot derive an extension id from {}", url)))?;
        let extension = object(json!({
            "id": format!("com.example.{}", name),
            "url": url,
            "name": name,
            "is_enabled": true,
            "preferences": {}
        }));
        s.lock().extensions.push(extension.clone());
        Ok(Value::Object(extension))
    })?;

    let s = Arc::clone(state);
    router.route("/extension/update-prefs", move |args| {
        let id = required_str(args, "id", 0)?;
        let data = required(args, "data", 1)?.clone();
        let mut state = s.lock();
        let ext = state.extension_mut(id)?;
        ext.insert("preferences".to_string(), data);
        Ok(Value::Null)
    })?;

    let s = Arc::clone(state);
    router.route("/extension/check-updates", move |args| {
        let id = required_str(args, "id", 0)?;
        let mut state = s.lock();
        state.extension_mut(id)?;
        Ok(json!({"has_update": false, "commit": "0000000"}))
    })?;

    let s = Arc::clone(state);
    router.route("/extension/update-ext", move |args| {
        let id = required_str(args, "id", 0)?;
        let mut state = s.lock();
        let ext = state.extension_mut(id)?;
        ext.insert(
            "updated_at".to_string(),
            Value::String("2026-10-18T00:00:00".to_string()),
        );
        Ok(Value::Object(ext.clone()))
    })?;

    let s = Arc::clone(state);
    router.route("/extension/toggle-enabled", move |args| {
        let id = required_str(args, "id", 0)?;
        let enabled = required(args, "enabled", 1)?
            .as_bool()
            .ok_or_else(|| invalid("'enabled' must be a boolean"))?;
        let mut state = s.lock();
        let ext = state.extension_mut(id)?;
        ext.insert("is_enabled".to_string(), Value::Bool(enabled));
        Ok(Value::Null)
    })?;

    let s = Arc::clone(state);
    router.route("/extension/remove", move |args| {
        let id = required_str(args, "id", 0)?;
        let mut state = s.lock();
        state.extension_mut(id)?;
        state
            .extensions
            .retain(|ext| ext.get("id").and_then(Value::as_str) != Some(id));
        Ok(Value::Null)
    })?;

    Ok(())
}
