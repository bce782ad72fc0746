//! Preferences resources on top of the bridge.

mod client;
mod types;

pub use client::PrefsClient;
pub use types::{Env, Extension, FileKind, Settings, Shortcut, ShortcutDraft, UpdateCheck};

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
