//! Module registry: instantiation, contribution aggregation and
//! dynamic-configuration wiring.
//!
//! The registry is constructed once during startup from a
//! [`ModuleCatalog`], told which modules to instantiate by name, and then
//! queried for the aggregated contributions of all registered modules. A
//! module that fails instantiation is logged and excluded; it never
//! affects the other modules or aborts startup.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::DynamicConfigSource;
use crate::contrib::{ActionBinding, Component, RestHandler, ScriptContextDef, Setting};
use crate::host::BaseDependencies;
use crate::module::{ConfigSubscription, Extraction, RestContext, SecurityModule};

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("unknown module: {0}")]
    UnknownModule(String),
    #[error("error while instantiating {name}: {reason}")]
    Instantiation { name: String, reason: String },
}

type ModuleFactory = Box<dyn Fn() -> Result<Arc<dyn SecurityModule>, ModuleError> + Send + Sync>;

/// Registration table mapping stable module identifiers to factories.
///
/// Factories are registered at startup; instantiating a module never
/// touches anything but its factory, so one broken module cannot prevent
/// the others from being constructed.
#[derive(Default)]
pub struct ModuleCatalog {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a stable identifier. A later
    /// registration under the same identifier replaces the earlier one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Result<Arc<dyn SecurityModule>, ModuleError> + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Instantiates the named module.
    pub fn create(&self, name: &str) -> Result<Arc<dyn SecurityModule>, ModuleError> {
        match self.factories.get(name) {
            Some(factory) => factory(),
            None => Err(ModuleError::UnknownModule(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

struct RegisteredModule {
    name: String,
    module: Arc<dyn SecurityModule>,
}

/// Holds the instantiated security modules and aggregates their
/// contributions.
///
/// Registration (`add`, `create_components`) runs during single-threaded
/// startup; afterwards the module collection is read-only and the
/// aggregation queries are safe to call from any thread.
pub struct ModuleRegistry {
    catalog: ModuleCatalog,
    modules: Vec<RegisteredModule>,
}

impl ModuleRegistry {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            catalog,
            modules: Vec::new(),
        }
    }

    /// Instantiates and registers the named modules, in order.
    ///
    /// A name that is unknown or whose factory fails is logged and
    /// skipped; the remaining modules still register.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, names: &[&str]) {
        for name in names {
            match self.catalog.create(name) {
                Ok(module) => {
                    debug!(module = name, "registered security module");
                    self.modules.push(RegisteredModule {
                        name: name.to_string(),
                        module,
                    });
                }
                Err(err) => {
                    error!(module = name, %err, "error while instantiating module");
                }
            }
        }
    }

    /// Names of the successfully registered modules, in registration
    /// order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All REST handlers, concatenated in registration order.
    pub fn rest_handlers(&self, ctx: &RestContext<'_>) -> Vec<Arc<dyn RestHandler>> {
        self.modules
            .iter()
            .flat_map(|m| m.module.rest_handlers(ctx))
            .collect()
    }

    /// All action bindings, concatenated in registration order.
    pub fn actions(&self) -> Vec<ActionBinding> {
        self.modules
            .iter()
            .flat_map(|m| m.module.actions())
            .collect()
    }

    /// All script contexts, concatenated in registration order.
    pub fn script_contexts(&self) -> Vec<ScriptContextDef> {
        self.modules
            .iter()
            .flat_map(|m| m.module.script_contexts())
            .collect()
    }

    /// All settings definitions, concatenated in registration order.
    pub fn settings(&self) -> Vec<Setting> {
        self.modules
            .iter()
            .flat_map(|m| m.module.settings())
            .collect()
    }

    /// Collects every module's runtime components and wires each module's
    /// configuration subscription, if it has one, into the dynamic
    /// configuration source.
    ///
    /// Must be called exactly once per module set: calling it again would
    /// register the config-change listeners a second time.
    pub fn create_components(&self, deps: &BaseDependencies) -> Vec<Arc<dyn Component>> {
        let mut components = Vec::new();
        for registered in &self.modules {
            components.extend(registered.module.components(deps));

            if let Some(subscription) = registered.module.config_subscription() {
                Self::register_config_listener(&registered.name, subscription, &deps.config_source);
            }
        }
        components
    }

    /// Wires one module's subscription into the change channel. Every
    /// failure inside the listener is absorbed: a malformed slice for one
    /// module must never block delivery to the other listeners, nor
    /// propagate into the configuration source.
    fn register_config_listener(
        module: &str,
        subscription: ConfigSubscription,
        source: &DynamicConfigSource,
    ) {
        let module = module.to_string();
        let config_type = subscription.config_type();
        source.add_config_change_listener(config_type, move |config| {
            match subscription.extract(config) {
                Extraction::Delivered => {
                    debug!(module = %module, %config_type, "delivered configuration slice");
                }
                Extraction::Absent => {}
                Extraction::Invalid(err) => {
                    error!(
                        module = %module,
                        %config_type,
                        entry = subscription.entry(),
                        %err,
                        "error while parsing configuration; change dropped",
                    );
                }
            }
        });
    }
}
