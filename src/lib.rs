//! # Searchwarden
//!
//! Extensibility core of a security add-on for a distributed search
//! engine: feature modules contribute REST handlers, action bindings,
//! script contexts, settings and runtime components into the host
//! process, and subscribe to typed slices of the dynamic security
//! configuration.
//!
//! ## Core Components
//!
//! * **Module contract** ([`module`]): the capability surface a feature
//!   module implements, everything optional
//! * **Module registry** ([`registry`]): instantiates modules from a
//!   catalog of factories, aggregates their contributions and wires
//!   their configuration subscriptions
//! * **Dynamic configuration** ([`config`]): configuration snapshots
//!   keyed by type, published through a change channel
//! * **Validation** ([`validation`], [`parser`]): sub-document parsers
//!   producing typed values or structured multi-error reports
//!
//! ## Configuration Extraction
//!
//! A module's [`module::ConfigSubscription`] names a configuration type,
//! an entry key and a JSON pointer, and carries a parser/consumer pair
//! constructed together over the same value type. Whenever the
//! configuration source publishes a snapshot of that type, the registry
//! extracts the pointed-to sub-document, parses it and hands the typed
//! value to the consumer. Absent configuration is a normal transient
//! state and is skipped silently; a slice that fails validation is
//! logged and dropped, so one module's malformed configuration never
//! blocks delivery to the others.

pub mod config;
pub mod contrib;
pub mod host;
pub mod module;
pub mod parser;
pub mod registry;
pub mod validation;

// Re-exports
pub use config::{ConfigType, DynamicConfigSource, SecurityConfiguration};
pub use module::{ConfigSubscription, Extraction, RestContext, SecurityModule};
pub use registry::{ModuleCatalog, ModuleError, ModuleRegistry};
pub use validation::{ConfigValidationError, ValidationError, ValidationErrors};
