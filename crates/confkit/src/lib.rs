//! Facade crate for confkit.
//! Re-exports the engine, the macros and the file loader under one name.
//! Keep this crate thin: it should compose other crates, not implement configuration logic.
//!
//! ## Usage
//! - Derive [`Parameters`] on a struct to declare a parameter set.
//! - Call [`configuration_for`] to get a configuration that can also read files.
//! - Call [`load`] to go from sources straight to the typed struct.
//!
//! ```rust
//! use confkit::prelude::*;
//!
//! #[derive(Debug, Parameters)]
//! struct Service {
//!     #[param(default = 8080, make_int, within = 1..=65535, lockable)]
//!     port: u16,
//!     #[param(default = "info", one_of = ["debug", "info", "warn"])]
//!     log_level: String,
//!     #[param(make_array)]
//!     origins: Vec<String>,
//! }
//!
//! let service: Service = confkit::load(Value::from_iter([
//!     ("port", Value::from("9000")),
//!     ("origins", Value::from("https://example.org")),
//! ]))?;
//! assert_eq!(service.port, 9000);
//! assert_eq!(service.origins, ["https://example.org"]);
//! # Ok::<(), ConfigError>(())
//! ```

pub use confkit_core::*;
pub use confkit_derive::{Parameters, confkit_error};
pub use confkit_loader as loader;
pub use confkit_loader::{FileLoader, LoaderError, env_source, parse_str};

/// Items most applications need.
pub mod prelude {
    pub use confkit_core::{
        Coercion, ConfigError, Configurable, Configuration, Constraints, FromValue,
        OPTIONS_SOURCE, Parameter, ParameterRegistry, Parameters, Source, TypeTag, Value,
    };
    pub use confkit_derive::Parameters;
    pub use confkit_loader::{FileLoader, env_source};
}

/// A fresh configuration over `P`, able to read files and streams.
#[must_use]
pub fn configuration_for<P: Parameters>() -> Configuration {
    Configuration::builder().registry(P::registry()).loader(FileLoader::new()).build()
}

/// Applies `source` to a fresh configuration over `P` and extracts the result.
///
/// # Errors
/// Returns the first validation or decode error of the source, or [`ConfigError::Extract`]
/// when a field cannot be read back.
pub fn load<P: Parameters>(source: impl Into<Source>) -> Result<P, ConfigError> {
    let mut configuration = configuration_for::<P>();
    configuration.configure(source)?;
    P::extract(&configuration)
}
