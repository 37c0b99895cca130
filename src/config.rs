//! Dynamic security configuration: typed documents and the change channel.
//!
//! A [`SecurityConfiguration`] is one loaded snapshot of one
//! [`ConfigType`]: a set of named entries, each a generic JSON value. The
//! [`DynamicConfigSource`] holds the latest snapshot per type and notifies
//! registered listeners whenever a snapshot is published or invalidated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use tracing::debug;

/// The security configuration document types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    Config,
    Roles,
    RolesMapping,
    InternalUsers,
    ActionGroups,
    Tenants,
    Audit,
}

/// One loaded snapshot of a security configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfiguration {
    config_type: ConfigType,
    version: u64,
    loaded_at: DateTime<Utc>,
    entries: HashMap<String, Value>,
}

impl SecurityConfiguration {
    pub fn new(config_type: ConfigType, version: u64, entries: HashMap<String, Value>) -> Self {
        Self {
            config_type,
            version,
            loaded_at: Utc::now(),
            entries,
        }
    }

    /// Empty snapshot, mostly useful as a starting point for [`Self::with_entry`].
    pub fn empty(config_type: ConfigType, version: u64) -> Self {
        Self::new(config_type, version, HashMap::new())
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: Value) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Looks up a named entry within this snapshot.
    pub fn entry(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type ConfigListener = Box<dyn Fn(Option<&SecurityConfiguration>) + Send + Sync>;

/// Publisher of configuration snapshots, keyed by [`ConfigType`].
///
/// Listeners for a type run synchronously on the publishing thread, in
/// registration order, and receive the latest snapshot (or `None` once a
/// type has been invalidated). Listeners must be cheap and must not fail:
/// a slow listener delays every listener registered after it on the same
/// channel. All listeners are expected to be registered during startup,
/// before the first publication.
#[derive(Default)]
pub struct DynamicConfigSource {
    current: DashMap<ConfigType, Arc<SecurityConfiguration>>,
    listeners: DashMap<ConfigType, Vec<ConfigListener>>,
}

impl DynamicConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for every future change of `config_type`.
    pub fn add_config_change_listener(
        &self,
        config_type: ConfigType,
        listener: impl Fn(Option<&SecurityConfiguration>) + Send + Sync + 'static,
    ) {
        self.listeners
            .entry(config_type)
            .or_default()
            .push(Box::new(listener));
    }

    /// The latest published snapshot for `config_type`, if any.
    pub fn current(&self, config_type: ConfigType) -> Option<Arc<SecurityConfiguration>> {
        self.current.get(&config_type).map(|entry| entry.value().clone())
    }

    /// Stores `config` as the latest snapshot of its type and notifies
    /// that type's listeners.
    pub fn publish(&self, config: SecurityConfiguration) {
        let config_type = config.config_type();
        let config = Arc::new(config);
        self.current.insert(config_type, config.clone());
        debug!(%config_type, version = config.version(), "security configuration changed");
        self.notify(config_type, Some(&config));
    }

    /// Drops the snapshot for `config_type` and notifies its listeners
    /// with an absent configuration.
    pub fn invalidate(&self, config_type: ConfigType) {
        self.current.remove(&config_type);
        debug!(%config_type, "security configuration invalidated");
        self.notify(config_type, None);
    }

    fn notify(&self, config_type: ConfigType, config: Option<&SecurityConfiguration>) {
        if let Some(listeners) = self.listeners.get(&config_type) {
            for listener in listeners.iter() {
                listener(config);
            }
        }
    }
}
