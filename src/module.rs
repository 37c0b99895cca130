//! The security module contract and its dynamic-configuration
//! subscription.
//!
//! A feature module contributes REST handlers, action bindings, script
//! contexts, settings and runtime components into the host process, all
//! optional. A module may additionally subscribe to a typed slice of the
//! dynamic security configuration through a [`ConfigSubscription`]: a
//! declarative binding of configuration type, entry key and sub-document
//! pointer to a matched parser/consumer pair.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{ConfigType, SecurityConfiguration};
use crate::contrib::{ActionBinding, Component, RestHandler, ScriptContextDef, Setting};
use crate::host::{BaseDependencies, ClusterService, IndexNameResolver, Settings};
use crate::parser::ValueParser;
use crate::validation::ConfigValidationError;

/// Read-only references handed to a module when it contributes REST
/// handlers.
pub struct RestContext<'a> {
    pub settings: &'a Settings,
    pub index_name_resolver: &'a IndexNameResolver,
    pub cluster_service: &'a ClusterService,
}

/// Capability surface a feature module may implement.
///
/// Every method is optional and defaults to contributing nothing. A
/// module is constructed once, through its catalog factory, and retained
/// by the registry for the remainder of the process lifetime.
pub trait SecurityModule: Send + Sync {
    /// Request-routing handlers this module adds.
    fn rest_handlers(&self, _ctx: &RestContext<'_>) -> Vec<Arc<dyn RestHandler>> {
        Vec::new()
    }

    /// Action bindings this module adds.
    fn actions(&self) -> Vec<ActionBinding> {
        Vec::new()
    }

    /// Script execution contexts this module adds.
    fn script_contexts(&self) -> Vec<ScriptContextDef> {
        Vec::new()
    }

    /// Long-lived runtime components this module adds, given the shared
    /// host dependencies.
    fn components(&self, _deps: &BaseDependencies) -> Vec<Arc<dyn Component>> {
        Vec::new()
    }

    /// Configuration settings this module defines.
    fn settings(&self) -> Vec<Setting> {
        Vec::new()
    }

    /// At most one subscription to a typed slice of the dynamic security
    /// configuration.
    fn config_subscription(&self) -> Option<ConfigSubscription> {
        None
    }
}

/// Outcome of one extraction attempt against a configuration snapshot.
///
/// Only `Invalid` represents a failure; an absent snapshot, entry or
/// sub-document node is a normal transient state during rolling updates.
#[derive(Debug)]
pub enum Extraction {
    /// The sub-document parsed and the consumer was invoked.
    Delivered,
    /// Snapshot, entry or pointed-to node was absent; consumer untouched.
    Absent,
    /// The sub-document failed validation; consumer untouched.
    Invalid(ConfigValidationError),
}

type Deliver = Arc<dyn Fn(&Value) -> Result<(), ConfigValidationError> + Send + Sync>;

/// Declarative binding of one typed configuration slice to its consumer.
///
/// The parser and the consumer are handed over together and erased into a
/// single delivery closure, so the value produced by the parser can only
/// ever reach the consumer it was constructed with.
#[derive(Clone)]
pub struct ConfigSubscription {
    config_type: ConfigType,
    entry: String,
    pointer: String,
    expected_value: Option<String>,
    deliver: Deliver,
}

impl ConfigSubscription {
    /// Binds `parser` and `consumer` to the node at `pointer` within the
    /// named `entry` of `config_type` snapshots.
    ///
    /// `pointer` is a JSON pointer; the empty pointer selects the whole
    /// entry.
    pub fn new<P, F>(
        config_type: ConfigType,
        entry: impl Into<String>,
        pointer: impl Into<String>,
        parser: P,
        consumer: F,
    ) -> Self
    where
        P: ValueParser + 'static,
        F: Fn(P::Output) + Send + Sync + 'static,
    {
        let expected_value = parser.expected_value();
        let deliver: Deliver = Arc::new(move |node: &Value| {
            consumer(parser.parse(node)?);
            Ok(())
        });
        Self {
            config_type,
            entry: entry.into(),
            pointer: pointer.into(),
            expected_value,
            deliver,
        }
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Description of the expected sub-document shape, if the parser
    /// provides one.
    pub fn expected_value(&self) -> Option<&str> {
        self.expected_value.as_deref()
    }

    /// Runs the extraction pipeline against a configuration snapshot.
    ///
    /// Resolves the entry, navigates to the pointed-to node, parses it
    /// and on success hands the typed value to the consumer. Every
    /// absence short-circuits to [`Extraction::Absent`] without touching
    /// the consumer.
    pub fn extract(&self, config: Option<&SecurityConfiguration>) -> Extraction {
        let Some(config) = config else {
            return Extraction::Absent;
        };
        let Some(entry) = config.entry(&self.entry) else {
            return Extraction::Absent;
        };
        let Some(node) = entry.pointer(&self.pointer) else {
            return Extraction::Absent;
        };
        match (self.deliver)(node) {
            Ok(()) => Extraction::Delivered,
            Err(err) => Extraction::Invalid(err),
        }
    }
}

impl fmt::Debug for ConfigSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSubscription")
            .field("config_type", &self.config_type)
            .field("entry", &self.entry)
            .field("pointer", &self.pointer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{StringParser, U64Parser};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    fn snapshot(entry: &str, value: Value) -> SecurityConfiguration {
        SecurityConfiguration::empty(ConfigType::Config, 1).with_entry(entry, value)
    }

    #[test]
    fn test_extract_delivers_pointed_to_value() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let subscription =
            ConfigSubscription::new(ConfigType::Config, "foo", "/bar/x", U64Parser, move |n| {
                sink.lock().unwrap().push(n);
            });

        let config = snapshot("foo", json!({"bar": {"x": 5}}));
        let outcome = subscription.extract(Some(&config));

        assert!(matches!(outcome, Extraction::Delivered));
        assert_eq!(*received.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_extract_absent_pointer_does_not_invoke_consumer() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let subscription =
            ConfigSubscription::new(ConfigType::Config, "foo", "/bar/y", U64Parser, move |n| {
                sink.lock().unwrap().push(n);
            });

        let config = snapshot("foo", json!({"bar": {"x": 5}}));
        assert!(matches!(subscription.extract(Some(&config)), Extraction::Absent));
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_extract_absent_entry_and_snapshot() {
        let subscription =
            ConfigSubscription::new(ConfigType::Config, "foo", "/bar", U64Parser, |_| {});

        assert!(matches!(subscription.extract(None), Extraction::Absent));

        let other_entry = snapshot("other", json!({"bar": 1}));
        assert!(matches!(
            subscription.extract(Some(&other_entry)),
            Extraction::Absent
        ));
    }

    #[test]
    fn test_extract_invalid_value_keeps_consumer_untouched() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let subscription =
            ConfigSubscription::new(ConfigType::Config, "foo", "/bar/x", U64Parser, move |n| {
                sink.lock().unwrap().push(n);
            });

        let config = snapshot("foo", json!({"bar": {"x": "not a number"}}));
        let outcome = subscription.extract(Some(&config));

        match outcome {
            Extraction::Invalid(err) => {
                assert_eq!(err.to_string(), "expected a non-negative integer; got a string");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_pointer_selects_whole_entry() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let subscription = ConfigSubscription::new(
            ConfigType::InternalUsers,
            "admin",
            "",
            crate::parser::FromJson::<serde_json::Map<String, Value>>::new(),
            move |entry| {
                sink.lock().unwrap().push(entry);
            },
        );

        let config = SecurityConfiguration::empty(ConfigType::InternalUsers, 1)
            .with_entry("admin", json!({"reserved": true}));
        assert!(matches!(subscription.extract(Some(&config)), Extraction::Delivered));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_expected_value_comes_from_parser() {
        let subscription =
            ConfigSubscription::new(ConfigType::Audit, "config", "/category", StringParser, |_| {});
        assert_eq!(subscription.expected_value(), Some("string"));
    }
}
