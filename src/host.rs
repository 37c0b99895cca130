//! Host collaborator handles and the dependency bundle handed to modules.
//!
//! These types model the host process surfaces a module may need when
//! creating components. They are deliberately thin: the host owns the
//! real machinery, modules only receive handles.

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use tokio::runtime::Handle;

use crate::config::DynamicConfigSource;

/// Read-only node settings, keyed by dotted setting name.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(default)
    }
}

/// Handle to the node-local client.
#[derive(Debug, Clone, Default)]
pub struct LocalClient {
    node_name: String,
}

impl LocalClient {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }
}

/// Current cluster topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryNodes {
    pub local_node_id: String,
    pub node_ids: Vec<String>,
}

/// Cluster name plus an accessor for the (changing) topology.
pub struct ClusterService {
    cluster_name: String,
    nodes: Arc<dyn Fn() -> DiscoveryNodes + Send + Sync>,
}

impl ClusterService {
    pub fn new(
        cluster_name: impl Into<String>,
        nodes: impl Fn() -> DiscoveryNodes + Send + Sync + 'static,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            nodes: Arc::new(nodes),
        }
    }

    /// A service over a topology that never changes.
    pub fn fixed(cluster_name: impl Into<String>, nodes: DiscoveryNodes) -> Self {
        Self::new(cluster_name, move || nodes.clone())
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// The topology as of now.
    pub fn nodes(&self) -> DiscoveryNodes {
        (self.nodes)()
    }
}

impl std::fmt::Debug for ClusterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterService")
            .field("cluster_name", &self.cluster_name)
            .finish_non_exhaustive()
    }
}

/// Handle to the host's worker pool.
#[derive(Debug, Clone)]
pub struct ThreadPool {
    handle: Handle,
}

impl ThreadPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// Index name patterns whose contents must never be touched by user
/// requests. Patterns support a trailing or embedded `*` wildcard.
#[derive(Debug, Clone, Default)]
pub struct ProtectedIndices {
    patterns: Vec<Regex>,
}

impl ProtectedIndices {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let escaped = regex::escape(pattern.as_ref()).replace(r"\*", ".*");
                Regex::new(&format!("^{escaped}$"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_protected(&self, index: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(index))
    }
}

/// Watches on-disk resources for changes.
#[derive(Debug, Clone, Default)]
pub struct ResourceWatcherService;

/// Compiles and runs stored scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptService;

/// Registry of named content types for document parsing.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry;

/// Node environment paths.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub config_dir: PathBuf,
}

impl Environment {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }
}

/// Resolves index name expressions against cluster state.
#[derive(Debug, Clone, Default)]
pub struct IndexNameResolver;

/// The document store backing the security configuration.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    index_name: String,
}

impl ConfigRepository {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }
}

impl Default for ConfigRepository {
    fn default() -> Self {
        Self::new(".warden")
    }
}

/// Shared host dependencies supplied once at component-creation time.
///
/// Immutable after construction.
#[derive(Clone)]
pub struct BaseDependencies {
    pub settings: Settings,
    pub local_client: Arc<LocalClient>,
    pub cluster_service: Arc<ClusterService>,
    pub thread_pool: Arc<ThreadPool>,
    pub resource_watcher: Arc<ResourceWatcherService>,
    pub script_service: Arc<ScriptService>,
    pub content_registry: Arc<ContentRegistry>,
    pub environment: Arc<Environment>,
    pub index_name_resolver: Arc<IndexNameResolver>,
    pub config_source: Arc<DynamicConfigSource>,
    pub config_repository: Arc<ConfigRepository>,
    pub protected_indices: Arc<ProtectedIndices>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_settings_typed_getters() {
        let mut values = Map::new();
        values.insert("warden.audit.enabled".to_string(), json!(true));
        values.insert("warden.audit.pool_size".to_string(), json!(8));
        let settings = Settings::new(values);

        assert!(settings.get_bool("warden.audit.enabled", false));
        assert_eq!(settings.get_u64("warden.audit.pool_size", 1), 8);
        assert_eq!(settings.get_u64("warden.missing", 4), 4);
        assert_eq!(settings.get_str("warden.audit.enabled"), None);
    }

    #[test]
    fn test_protected_indices_wildcards() {
        let protected = ProtectedIndices::new([".warden", ".tasks-*"]).unwrap();

        assert!(protected.is_protected(".warden"));
        assert!(protected.is_protected(".tasks-2026.01"));
        assert!(!protected.is_protected(".warden-backup"));
        assert!(!protected.is_protected("logs"));
    }

    #[test]
    fn test_cluster_service_topology_accessor() {
        let service = ClusterService::fixed(
            "search-cluster",
            DiscoveryNodes {
                local_node_id: "n1".to_string(),
                node_ids: vec!["n1".to_string(), "n2".to_string()],
            },
        );

        assert_eq!(service.cluster_name(), "search-cluster");
        assert_eq!(service.nodes().node_ids.len(), 2);
    }
}
