use confkit_core::ConfigError;
use std::borrow::Cow;

/// A specialized [`LoaderError`] enum of this crate.
#[confkit_derive::confkit_error]
pub enum LoaderError {
    #[error("Failed to read configuration source{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid YAML document{}: {source}", format_context(.context))]
    Yaml { source: serde_yaml::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid JSON document{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid TOML document{}: {source}", format_context(.context))]
    Toml { source: toml::de::Error, context: Option<Cow<'static, str>> },

    #[error("Loader error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<LoaderError> for ConfigError {
    fn from(err: LoaderError) -> Self {
        Self::decode(err)
    }
}
