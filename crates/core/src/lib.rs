//! Declarative configuration parameters.
//! A configurable kind declares its parameters once, each with a set of constraints; every
//! instance then stores values that were validated, normalized and converted by those
//! constraints before they landed.
//!
//! # Core Features
//!
//! - **Declared Parameters**: A [`ParameterRegistry`] built once per kind, shared by all of its instances.
//! - **Ordered Constraint Chain**: lockable, `not_nil`, `not_empty`, `must_be`, `must_respond_to`, `make_*`, `max`, `min`, membership, `convert`.
//! - **Lazy Defaults**: Materialized on first read and returned as the same instance afterwards.
//! - **Bulk Configuration**: Mappings, sequences, the reserved `options_source` key, files and streams.
//! - **Fail-Fast Errors**: One [`ConfigError`] variant per failure category, no rollback.
//!
//! # Architectural Overview
//!
//! 1.  **[`Constraints`]**: The rule set of one parameter, written as a builder expression.
//! 2.  **[`ParameterRegistry`]**: The frozen declarations, produced by [`RegistryBuilder`].
//! 3.  **[`Configuration`]**: Per-instance storage, lock flag and bulk-apply engine.
//! 4.  **[`SourceLoader`]**: The seam through which files and streams are decoded.
//!
//! # Examples
//!
//! ```rust
//! use confkit_core::{ConfigError, Configuration, Constraints, ParameterRegistry, Value};
//!
//! let registry = ParameterRegistry::builder()
//!     .param("workers", Constraints::new().default(4).make_int().within(1..=64))
//!     .param("tags", Constraints::new().make_array())
//!     .build();
//!
//! let mut config = Configuration::new(registry);
//! assert_eq!(config.get("workers")?, &Value::Int(4));
//!
//! config.configure(Value::from_iter([
//!     ("workers", Value::from("8")),
//!     ("tags", Value::from("edge")),
//! ]))?;
//! assert_eq!(config.get_as::<i64>("workers")?, 8);
//! assert_eq!(config.get_as::<Vec<String>>("tags")?, ["edge"]);
//!
//! let err = config.set("workers", 100).unwrap_err();
//! assert_eq!(err.kind(), "Range");
//! # Ok::<(), ConfigError>(())
//! ```

mod builder;
mod codec;
mod constraint;
mod engine;
mod error;
mod extract;
mod host;
mod params;
mod registry;
mod source;
mod value;

pub use builder::{ConfigurationBuilder, NoRegistry, WithRegistry};
pub use constraint::{Coercion, Constraints, Convert, DefaultValue, Membership};
pub use engine::{Configuration, MAX_NESTED_FILES};
pub use error::{BoxError, ConfigError, ConfigErrorExt};
pub use extract::FromValue;
pub use host::{Host, NoHost};
pub use params::{Configurable, Parameters};
pub use registry::{Parameter, ParameterRegistry, ParameterSpec, RegistryBuilder};
pub use source::{Format, OPTIONS_SOURCE, Source, SourceLoader};
pub use value::{Map, Object, TypeTag, Value};
