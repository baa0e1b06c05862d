use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// Boxed error produced by a source loader while decoding an external medium.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized [`ConfigError`] enum of this crate.
///
/// Every failure of a write, a bulk apply or a typed read is reported through one of these
/// variants. Validation variants carry the offending parameter name, see [`ConfigError::parameter`].
#[confkit_derive::confkit_error]
pub enum ConfigError {
    /// A `lockable` parameter was written while the instance was locked.
    #[error("Parameter '{parameter}' cannot be set at this time{}", format_context(.context))]
    Locked { parameter: Arc<str>, context: Option<Cow<'static, str>> },

    #[error("Parameter '{parameter}' cannot be null{}", format_context(.context))]
    NullNotAllowed { parameter: Arc<str>, context: Option<Cow<'static, str>> },

    #[error("Parameter '{parameter}' cannot be empty{}", format_context(.context))]
    EmptyNotAllowed { parameter: Arc<str>, context: Option<Cow<'static, str>> },

    #[error("Wrong type for '{parameter}'{}: {message}", format_context(.context))]
    TypeConstraint {
        parameter: Arc<str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error(
        "Parameter '{parameter}' must respond to '{capability}'{}",
        format_context(.context)
    )]
    CapabilityMissing {
        parameter: Arc<str>,
        capability: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// A `make_*` coercion could not turn the value into the requested shape.
    #[error("Cannot coerce '{parameter}'{}: {message}", format_context(.context))]
    Coercion {
        parameter: Arc<str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// The value violated `max`, `min` or a membership constraint.
    #[error("Parameter '{parameter}' is out of range{}: {message}", format_context(.context))]
    Range {
        parameter: Arc<str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("Conversion of '{parameter}' failed{}: {message}", format_context(.context))]
    Conversion {
        parameter: Arc<str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unknown parameter '{parameter}'{}", format_context(.context))]
    UnknownParameter { parameter: Arc<str>, context: Option<Cow<'static, str>> },

    #[error("Unsupported configuration source{}: {message}", format_context(.context))]
    UnsupportedSource { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A file source was reached again while it was still being applied.
    #[error(
        "Configuration source '{}' includes itself{}: {chain}",
        .path.display(),
        format_context(.context)
    )]
    SourceCycle { path: PathBuf, chain: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Failed to decode configuration source{}: {source}", format_context(.context))]
    SourceDecode { source: BoxError, context: Option<Cow<'static, str>> },

    /// A stored value could not be read back as the requested Rust type.
    #[error("Cannot extract '{parameter}'{}: {message}", format_context(.context))]
    Extract {
        parameter: Arc<str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal configuration error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ConfigError {
    /// Builds a [`ConfigError::SourceDecode`] from any decoder error.
    pub fn decode(source: impl Into<BoxError>) -> Self {
        Self::SourceDecode { source: source.into(), context: None }
    }

    pub(crate) fn unknown(parameter: &str) -> Self {
        Self::UnknownParameter { parameter: Arc::from(parameter), context: None }
    }

    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedSource { message: message.into(), context: None }
    }

    /// Returns `true` for the variants raised by the constraint chain of a single write.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Locked { .. }
                | Self::NullNotAllowed { .. }
                | Self::EmptyNotAllowed { .. }
                | Self::TypeConstraint { .. }
                | Self::CapabilityMissing { .. }
                | Self::Coercion { .. }
                | Self::Range { .. }
                | Self::Conversion { .. }
        )
    }
}
