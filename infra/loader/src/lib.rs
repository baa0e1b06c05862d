//! External media for confkit configurations.
//! Decodes YAML, JSON and TOML files or streams into documents the engine can apply, and
//! collects prefixed environment variables into an override mapping.
//!
//! # Examples
//!
//! ```rust
//! use confkit_core::{Configuration, Constraints, ParameterRegistry, Value};
//! use confkit_loader::FileLoader;
//! # use std::io::Write;
//!
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("server.yml");
//! # std::fs::File::create(&path).unwrap().write_all(b"port: 8443\n").unwrap();
//! let registry = ParameterRegistry::builder()
//!     .param("port", Constraints::new().make_int())
//!     .build();
//! let mut config = Configuration::builder().registry(registry).loader(FileLoader::new()).build();
//!
//! config.configure(path.as_path())?;
//! assert_eq!(config.get("port")?, &Value::Int(8443));
//! # Ok::<(), confkit_core::ConfigError>(())
//! ```

mod env;
mod error;

pub use env::{ENV_SEPARATOR, env_source, env_source_from};
pub use error::{LoaderError, LoaderErrorExt};

use confkit_core::{ConfigError, Format, Map, SourceLoader, Value};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Decodes documents by format: YAML, JSON or TOML.
///
/// Files are decoded according to their extension; files with an unknown or missing
/// extension, and streams without an explicit format, use the fallback format.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader {
    fallback: Format,
}

impl FileLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the format used when none can be detected. Defaults to YAML.
    #[must_use]
    pub const fn fallback(mut self, format: Format) -> Self {
        self.fallback = format;
        self
    }

    /// Reads and decodes a file.
    ///
    /// # Errors
    /// Returns [`LoaderError::Io`] when the file cannot be read, or the decoder error of the
    /// detected format.
    pub fn read_path(&self, path: &Path) -> Result<Value, LoaderError> {
        let format = Format::from_path(path).unwrap_or(self.fallback);
        let text = std::fs::read_to_string(path).context(format!("Reading {}", path.display()))?;
        debug!(path = %path.display(), %format, "Decoding configuration file");
        parse_str(&text, format)
    }
}

impl SourceLoader for FileLoader {
    fn load_path(&self, path: &Path) -> Result<Value, ConfigError> {
        Ok(self.read_path(path)?)
    }

    fn load_reader(
        &self,
        reader: &mut dyn Read,
        format: Option<Format>,
    ) -> Result<Value, ConfigError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).context("Reading configuration stream")?;
        Ok(parse_str(&text, format.unwrap_or(self.fallback))?)
    }
}

/// Decodes an in-memory document.
///
/// Blank input decodes to an empty mapping in every format.
///
/// # Errors
/// Returns the decoder error of `format`.
pub fn parse_str(text: &str, format: Format) -> Result<Value, LoaderError> {
    if text.trim().is_empty() {
        return Ok(Value::Map(Map::new()));
    }
    let value = match format {
        Format::Yaml => serde_yaml::from_str(text)?,
        Format::Json => serde_json::from_str(text)?,
        Format::Toml => toml::from_str(text)?,
    };
    Ok(value)
}
