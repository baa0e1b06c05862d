//! # Logger
//!
//! Logging bootstrap for confkit applications.
//! It configures console and file logging with rotation, non-blocking I/O and
//! environment-based filtering. The logger's own settings are a confkit parameter set,
//! so they can come from the same files and overrides as the rest of an application's
//! configuration and are validated by the same constraints.
//!
//! * Console output is written to stderr in the compact format.
//! * File output goes through a rolling appender, as plain text or JSON.
//! * Use [`LoggerBuilder::env_filter`] to set module-directed filters
//!   (e.g., `"myapp=debug,confkit_core=trace"`), in addition to `RUST_LOG`.
//!
//! ## Example
//!
//! ```rust
//! # use confkit_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("my-app")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use confkit::{ConfigError, Configuration, Parameters, Source, TypeTag, Value};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_SUFFIX: &str = "log";

/// Accepted values of the `level` setting.
pub const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Accepted values of the `rotation` setting.
pub const ROTATIONS: [&str; 4] = ["minutely", "hourly", "daily", "never"];

/// Declared logger settings.
///
/// | parameter   | default     | constraints                        |
/// |-------------|-------------|------------------------------------|
/// | `name`      | `"confkit"` | string, not empty                  |
/// | `level`     | `"info"`    | one of [`LEVELS`]                  |
/// | `console`   | `true`      | switch word (`yes`, `off`, ...)    |
/// | `json`      | `false`     | switch word                        |
/// | `directory` | unset       | string path; enables file output   |
/// | `max_files` | `10`        | integer, at least 1                |
/// | `rotation`  | `"daily"`   | one of [`ROTATIONS`]               |
/// | `filter`    | unset       | extra `EnvFilter` directives       |
#[derive(Debug, Clone, PartialEq, Eq, Parameters)]
pub struct LoggerSettings {
    #[param(default = "confkit", not_empty, must_be = [TypeTag::String])]
    pub name: String,
    #[param(default = "info", make_string, one_of = LEVELS)]
    pub level: String,
    #[param(default = true, make_flag)]
    pub console: bool,
    #[param(default = false, make_flag)]
    pub json: bool,
    #[param(must_be = [TypeTag::Null, TypeTag::String])]
    pub directory: Option<PathBuf>,
    #[param(default = 10, make_int, min = 1)]
    pub max_files: usize,
    #[param(default = "daily", make_string, one_of = ROTATIONS)]
    pub rotation: String,
    #[param(must_be = [TypeTag::Null, TypeTag::String])]
    pub filter: Option<String>,
}

impl LoggerSettings {
    /// Reads the settings from a configuration source.
    ///
    /// # Errors
    /// Returns [`LoggerError::Settings`] when a setting is rejected.
    pub fn from_source(source: impl Into<Source>) -> Result<Self, LoggerError> {
        let mut configuration = confkit::configuration_for::<Self>();
        configuration.configure(source)?;
        Ok(Self::extract(&configuration)?)
    }

    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        self.level.parse().map_err(|_| LoggerError::InvalidConfiguration {
            message: format!("Unknown log level '{}'", self.level).into(),
            context: None,
        })
    }

    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown rotation name.
    pub fn rotation_policy(&self) -> Result<Rotation, LoggerError> {
        match self.rotation.as_str() {
            "minutely" => Ok(Rotation::MINUTELY),
            "hourly" => Ok(Rotation::HOURLY),
            "daily" => Ok(Rotation::DAILY),
            "never" => Ok(Rotation::NEVER),
            other => Err(LoggerError::InvalidConfiguration {
                message: format!("Unknown rotation '{other}'").into(),
                context: None,
            }),
        }
    }
}

/// A builder for configuring and initializing the global tracing subscriber.
///
/// Each setter writes one parameter of [`LoggerSettings`]. The first rejected write is kept
/// and reported by [`LoggerBuilder::init`]; later setters are ignored.
#[derive(Debug)]
pub struct LoggerBuilder {
    configuration: Configuration,
    error: Option<ConfigError>,
}

impl LoggerBuilder {
    fn apply(mut self, name: &str, value: impl Into<Value>) -> Self {
        if self.error.is_none()
            && let Err(err) = self.configuration.set(name, value)
        {
            self.error = Some(err);
        }
        self
    }

    /// Sets the name of the logger, used as the log file prefix.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn name(self, name: impl Into<String>) -> Self {
        self.apply("name", name.into())
    }

    /// Configures the minimum log level to be emitted.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn level(self, level: LevelFilter) -> Self {
        self.apply("level", level.to_string().to_ascii_lowercase())
    }

    /// Enables console logging.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn console(self, enabled: bool) -> Self {
        self.apply("console", enabled)
    }

    /// Enables JSON formatting for file output.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn json(self) -> Self {
        self.apply("json", true)
    }

    /// Sets the directory of log files and enables file output.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn directory(self, path: impl Into<PathBuf>) -> Self {
        self.apply("directory", path.into())
    }

    /// Configures maximum number of log files to keep.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn max_files(self, max: usize) -> Self {
        self.apply("max_files", i64::try_from(max).unwrap_or(i64::MAX))
    }

    /// Configures the log file rotation strategy.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(self, rotation: &Rotation) -> Self {
        let name = if *rotation == Rotation::MINUTELY {
            "minutely"
        } else if *rotation == Rotation::HOURLY {
            "hourly"
        } else if *rotation == Rotation::NEVER {
            "never"
        } else {
            "daily"
        };
        self.apply("rotation", name)
    }

    /// Adds an explicit env filter (e.g., `myapp=debug,confkit_core=trace`).
    ///
    /// Environment variables still override via `RUST_LOG`; this is a programmatic default.
    /// Invalid filters will cause [`LoggerBuilder::init`] to return an error.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(self, filter: impl Into<String>) -> Self {
        self.apply("filter", filter.into())
    }

    /// Applies settings from a configuration source, such as a `logging` section of a file.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn configure(mut self, source: impl Into<Source>) -> Self {
        if self.error.is_none()
            && let Err(err) = self.configuration.configure(source)
        {
            self.error = Some(err);
        }
        self
    }

    /// Consumes the builder and returns the collected settings.
    ///
    /// # Errors
    /// Returns [`LoggerError::Settings`] for the first rejected setting.
    pub fn settings(self) -> Result<LoggerSettings, LoggerError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        Ok(LoggerSettings::extract(&self.configuration)?)
    }

    /// Consumes the builder and initializes the global tracing subscriber.
    ///
    /// # Returns
    /// A [`Logger`] handle. **Note:** This handle contains a [`WorkerGuard`]
    /// that must be kept alive for the duration of the program to ensure
    /// that non-blocking logs are flushed correctly.
    ///
    /// # Errors
    /// Returns [`LoggerError::Settings`] for a rejected setting.
    /// Returns [`LoggerError::Subscriber`] if a global subscriber has already been set.
    /// Returns [`LoggerError::InvalidConfiguration`] for settings that cannot be combined.
    pub fn init(self) -> Result<Logger, LoggerError> {
        Logger::init(&self.settings()?)
    }
}

/// A handle to the initialized logging system.
///
/// This struct holds the background worker guards. Drop this struct only
/// when the application is shutting down.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`] with every setting at its default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use confkit_logger::{LevelFilter, Logger};
    ///
    /// let _logger = Logger::builder()
    ///     .name("my-app")
    ///     .level(LevelFilter::DEBUG)
    ///     .init()
    ///     .unwrap();
    /// ```
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { configuration: confkit::configuration_for::<LoggerSettings>(), error: None }
    }

    /// Initializes the global tracing subscriber from already validated settings.
    ///
    /// # Errors
    /// See [`LoggerBuilder::init`].
    pub fn init(settings: &LoggerSettings) -> Result<Self, LoggerError> {
        let env_filter = build_env_filter(settings)?;

        let mut layers = Vec::new();

        if settings.console {
            layers.push(layer().compact().with_writer(std::io::stderr).with_ansi(true).boxed());
        }

        let guard = if let Some(path) = &settings.directory {
            fs::create_dir_all(path).map_err(|e| LoggerError::Internal {
                message: e.to_string().into(),
                context: Some(format!("Failed to create path: {}", path.display()).into()),
            })?;

            let file_appender = RollingFileAppender::builder()
                .rotation(settings.rotation_policy()?)
                .filename_prefix(&settings.name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(settings.max_files)
                .build(path)?;

            let (non_blocking, g) = tracing_appender::non_blocking(file_appender);

            let file_layer = layer().with_writer(non_blocking).with_ansi(false);

            let boxed = if settings.json { file_layer.json().boxed() } else { file_layer.boxed() };

            layers.push(boxed);
            Some(g)
        } else {
            None
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

        tracing::debug!(name = %settings.name, level = %settings.level, "Logger initialized");
        Ok(Self { guard })
    }

    /// Manually triggers a flush of all pending logs in the non-blocking worker.
    ///
    /// While flushing happens automatically when this handle is dropped, this
    /// method acts as a best-effort synchronization point before shutdown.
    pub fn flush(&self) {
        tracing::debug!("Logger flushed");
    }

    /// Returns a reference to the underlying worker guard, if present.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn build_env_filter(settings: &LoggerSettings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level_filter()?.into());
    settings.filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{filter}': {e}").into(),
                context: None,
            })
        },
    )
}
