//! Route table of the fixture host.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::error::HostError;
use crate::protocol::Args;

pub type RouteHandler = Arc<dyn Fn(&Args) -> Result<Value, HostError> + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Route path cannot be empty")]
    EmptyPath,
    #[error("Route not found for path {0}")]
    NotFound(String),
}

impl RouteError {
    fn type_name(&self) -> &'static str {
        match self {
            Self::EmptyPath => "RoutePathEmpty",
            Self::NotFound(_) => "RouteNotFound",
        }
    }

    /// The error shape the host reports to the page.
    pub fn to_host_error(&self) -> HostError {
        HostError::structured(self.to_string(), self.type_name()).with_error_name("Other")
    }
}

/// `/shortcut/add/`, `shortcut/add` and `/shortcut/add` are the same route.
fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

#[derive(Default, Clone)]
pub struct HostRouter {
    routes: HashMap<String, RouteHandler>,
}

impl HostRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Args) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        let key = normalize(path);
        if key.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        self.routes.insert(key.to_string(), Arc::new(handler));
        Ok(self)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(normalize(path))
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.routes.keys().map(|p| format!("/{}", p)).collect();
        paths.sort();
        paths
    }

    pub fn dispatch(&self, path: &str, args: &Args) -> Result<Value, HostError> {
        let Some(handler) = self.routes.get(normalize(path)) else {
            return Err(RouteError::NotFound(path.to_string()).to_host_error());
        };
        debug!(path, args = args.len(), "Dispatching host route");
        handler(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_paths_are_normalized() {
        let mut router = HostRouter::new();
        router.route("/get/all/", |_| Ok(json!({"ok": true}))).unwrap();

        assert!(router.contains("get/all"));
        assert!(router.contains("/get/all"));
        assert_eq!(router.dispatch("/get/all", &Args::None), Ok(json!({"ok": true})));
        assert_eq!(router.paths(), vec!["/get/all"]);
    }

    #[test]
    fn test_empty_route_is_rejected() {
        let mut router = HostRouter::new();
        assert!(matches!(
            router.route("/", |_| Ok(Value::Null)),
            Err(RouteError::EmptyPath)
        ));
    }

    #[test]
    fn test_unknown_route_reports_structured_error() {
        let router = HostRouter::new();
        let err = router.dispatch("/nope", &Args::None).unwrap_err();
        assert_eq!(err.error_type(), Some("RouteNotFound"));
        assert_eq!(err.message(), "Route not found for path /nope");
    }

    #[test]
    fn test_handler_errors_pass_through() {
        let mut router = HostRouter::new();
        router
            .route("/set", |_| Err(HostError::Message("read-only".to_string())))
            .unwrap();
        assert_eq!(
            router.dispatch("/set", &Args::None),
            Err(HostError::Message("read-only".to_string()))
        );
    }
}
