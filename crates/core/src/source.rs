use crate::error::ConfigError;
use crate::value::{Map, Value};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Reserved key: its value is resolved as a nested source instead of being assigned.
pub const OPTIONS_SOURCE: &str = "options_source";

/// Serialization format of an external medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl Format {
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Detects the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        })
    }
}

/// Decodes external media into documents.
///
/// The engine itself never touches the filesystem: path and reader sources are handed to the
/// loader attached to the [`Configuration`](crate::Configuration).
pub trait SourceLoader: fmt::Debug + Send + Sync {
    /// # Errors
    /// Returns [`ConfigError::SourceDecode`] when the file cannot be read or decoded.
    fn load_path(&self, path: &Path) -> Result<Value, ConfigError>;

    /// # Errors
    /// Returns [`ConfigError::SourceDecode`] when the stream cannot be read or decoded.
    fn load_reader(&self, reader: &mut dyn Read, format: Option<Format>)
    -> Result<Value, ConfigError>;
}

/// Anything a configuration can be bulk-applied from.
pub enum Source {
    /// An in-memory document: a mapping, or a sequence of nested sources.
    Value(Value),
    /// Sources applied in order; later ones win.
    List(Vec<Source>),
    Path(PathBuf),
    Reader { reader: Box<dyn Read + Send>, format: Option<Format> },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn reader(reader: impl Read + Send + 'static, format: Option<Format>) -> Self {
        Self::Reader { reader: Box::new(reader), format }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::List(sources) => f.debug_tuple("List").field(sources).finish(),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Reader { format, .. } => {
                f.debug_struct("Reader").field("format", format).finish_non_exhaustive()
            }
        }
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Map> for Source {
    fn from(entries: Map) -> Self {
        Self::Value(Value::Map(entries))
    }
}

impl From<Vec<Self>> for Source {
    fn from(sources: Vec<Self>) -> Self {
        Self::List(sources)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}
