//! Contribution kinds a security module can add to the host process:
//! REST handlers, action bindings, script contexts, settings definitions
//! and long-lived runtime components.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use strum_macros::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Default)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

/// One route a REST handler answers on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RestRequest {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Value,
}

impl RestResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: Value::Null,
        }
    }
}

/// A request-routing handler contributed by a module.
#[async_trait]
#[mockall::automock]
pub trait RestHandler: Send + Sync {
    fn name(&self) -> &str;

    /// The routes this handler answers on.
    fn routes(&self) -> Vec<Route>;

    async fn handle(&self, request: RestRequest) -> RestResponse;
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid action request: {0}")]
    InvalidRequest(String),
    #[error("action failed: {0}")]
    Failed(String),
}

/// Executes one named transport action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, request: Value) -> Result<Value, ActionError>;
}

/// Binding of an action name to its handler.
#[derive(Clone)]
pub struct ActionBinding {
    pub action: String,
    pub handler: Arc<dyn ActionHandler>,
}

impl ActionBinding {
    pub fn new(action: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            action: action.into(),
            handler,
        }
    }
}

impl fmt::Debug for ActionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBinding")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// A script execution context contributed by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptContextDef {
    pub name: String,
}

impl ScriptContextDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SettingScope {
    Node,
    Index,
}

/// A configuration setting definition contributed by a module.
///
/// `filtered` settings are withheld from settings listings by the host's
/// settings-filtering machinery.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub key: String,
    pub default: Value,
    pub scope: SettingScope,
    pub filtered: bool,
}

impl Setting {
    pub fn node(key: impl Into<String>, default: Value) -> Self {
        Self {
            key: key.into(),
            default,
            scope: SettingScope::Node,
            filtered: false,
        }
    }

    pub fn index(key: impl Into<String>, default: Value) -> Self {
        Self {
            key: key.into(),
            default,
            scope: SettingScope::Index,
            filtered: false,
        }
    }

    pub fn filtered(mut self) -> Self {
        self.filtered = true;
        self
    }
}

/// A long-lived runtime component contributed by a module, retained by the
/// host for the remainder of the process lifetime.
pub trait Component: Send + Sync {
    fn name(&self) -> &str;
}
