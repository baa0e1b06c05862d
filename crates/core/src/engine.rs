use crate::builder::ConfigurationBuilder;
use crate::error::{ConfigError, ConfigErrorExt};
use crate::extract::FromValue;
use crate::host::{Host, NoHost};
use crate::registry::{Parameter, ParameterRegistry};
use crate::source::{OPTIONS_SOURCE, Source, SourceLoader};
use crate::value::{Map, Value};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Deepest chain of files that may include one another through [`OPTIONS_SOURCE`].
pub const MAX_NESTED_FILES: usize = 32;

/// Per-instance parameter storage driven by a shared [`ParameterRegistry`].
///
/// A configuration holds one slot per declared parameter, a lock flag and an optional
/// [`SourceLoader`] for file and stream sources. Every write runs the parameter's constraint
/// chain; a failing write leaves the slot untouched. Bulk application through
/// [`Configuration::configure`] stops at the first failure without rolling back earlier writes.
///
/// # Examples
///
/// ```rust
/// use confkit_core::{Configuration, Constraints, ParameterRegistry, Value};
///
/// let registry = ParameterRegistry::builder()
///     .param("port", Constraints::new().default(8080).make_int().lockable())
///     .param("host", Constraints::new().not_empty())
///     .build();
///
/// let mut config = Configuration::new(registry);
/// config.configure(Value::from_iter([("port", Value::from("9090")), ("host", Value::from("db"))]))?;
/// assert_eq!(config.get("port")?, &Value::Int(9090));
///
/// config.lock();
/// assert!(config.set("port", 1).is_err());
/// # Ok::<(), confkit_core::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Configuration {
    pub(crate) registry: Arc<ParameterRegistry>,
    pub(crate) values: Vec<OnceCell<Value>>,
    pub(crate) locked: bool,
    pub(crate) loader: Option<Arc<dyn SourceLoader>>,
}

impl Configuration {
    /// Creates an unlocked configuration with every parameter unset.
    #[must_use]
    pub fn new(registry: Arc<ParameterRegistry>) -> Self {
        let values = std::iter::repeat_with(OnceCell::new).take(registry.len()).collect();
        Self { registry, values, locked: false, loader: None }
    }

    #[must_use = "Creates a new configuration builder"]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.registry.param_names()
    }

    #[must_use]
    pub const fn locked(&self) -> bool {
        self.locked
    }

    /// Freezes every `lockable` parameter.
    pub fn lock(&mut self) -> &mut Self {
        self.set_locked(true)
    }

    pub fn unlock(&mut self) -> &mut Self {
        self.set_locked(false)
    }

    pub fn set_locked(&mut self, locked: bool) -> &mut Self {
        if self.locked != locked {
            debug!(locked, "Configuration lock state changed");
        }
        self.locked = locked;
        self
    }

    #[must_use]
    pub fn loader(&self) -> Option<&Arc<dyn SourceLoader>> {
        self.loader.as_ref()
    }

    pub fn set_loader(&mut self, loader: Arc<dyn SourceLoader>) -> &mut Self {
        self.loader = Some(loader);
        self
    }

    /// Reads a parameter.
    ///
    /// A parameter never written reads as its default, materialized on first access and
    /// returned as the same instance afterwards; without a default it reads as
    /// [`Value::Null`].
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownParameter`] for undeclared names.
    pub fn get(&self, name: &str) -> Result<&Value, ConfigError> {
        let index = self.registry.index_of(name)?;
        Ok(self.slot(index))
    }

    /// Reads a parameter through its handle.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownParameter`] for a handle of another registry.
    pub fn read(&self, parameter: &Parameter) -> Result<&Value, ConfigError> {
        let index = self.registry.resolve(parameter)?;
        Ok(self.slot(index))
    }

    /// Reads a parameter as a Rust type.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownParameter`] for undeclared names and
    /// [`ConfigError::Extract`] when the stored value has another shape.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T, ConfigError> {
        let index = self.registry.index_of(name)?;
        T::from_value(self.slot(index)).map_err(|message| ConfigError::Extract {
            parameter: Arc::from(name),
            message,
            context: None,
        })
    }

    /// Whether the parameter holds a value: written, or a default already read.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.registry
            .index_of(name)
            .ok()
            .and_then(|index| self.values.get(index))
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Writes a parameter through its constraint chain.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownParameter`] for undeclared names, or the error of the
    /// first failing constraint. The stored value is unchanged on error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        self.set_with(name, value, &mut NoHost)
    }

    /// Like [`Configuration::set`], with an owner for `convert` methods.
    ///
    /// # Errors
    /// See [`Configuration::set`].
    pub fn set_with(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        host: &mut dyn Host,
    ) -> Result<(), ConfigError> {
        let index = self.registry.index_of(name)?;
        self.store(index, value.into(), host)
    }

    /// Writes a parameter through its handle.
    ///
    /// # Errors
    /// See [`Configuration::set`].
    pub fn write(
        &mut self,
        parameter: &Parameter,
        value: impl Into<Value>,
    ) -> Result<(), ConfigError> {
        let index = self.registry.resolve(parameter)?;
        self.store(index, value.into(), &mut NoHost)
    }

    /// Bulk-applies a source.
    ///
    /// Mapping entries are assigned in iteration order, except the reserved
    /// [`OPTIONS_SOURCE`] key whose value is resolved as a nested source. Sequences apply
    /// each element in order, so later elements win.
    ///
    /// # Errors
    /// Stops at the first failing entry and returns its error. Entries applied before the
    /// failure stay applied.
    pub fn configure(&mut self, source: impl Into<Source>) -> Result<&mut Self, ConfigError> {
        self.configure_with(source, &mut NoHost)
    }

    /// Like [`Configuration::configure`], with an owner for `convert` methods.
    ///
    /// # Errors
    /// See [`Configuration::configure`].
    pub fn configure_with(
        &mut self,
        source: impl Into<Source>,
        host: &mut dyn Host,
    ) -> Result<&mut Self, ConfigError> {
        self.apply_source(source.into(), host, &mut Vec::new())?;
        Ok(self)
    }

    /// Like [`Configuration::configure`], then runs `finish` once everything applied.
    ///
    /// # Errors
    /// See [`Configuration::configure`]. `finish` is not run on error.
    pub fn configure_then<F>(
        &mut self,
        source: impl Into<Source>,
        finish: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: FnOnce(&mut Self),
    {
        self.configure_with_then(source, &mut NoHost, finish)
    }

    /// Like [`Configuration::configure_with`], then runs `finish` once everything applied.
    ///
    /// # Errors
    /// See [`Configuration::configure`]. `finish` is not run on error.
    pub fn configure_with_then<F>(
        &mut self,
        source: impl Into<Source>,
        host: &mut dyn Host,
        finish: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: FnOnce(&mut Self),
    {
        self.apply_source(source.into(), host, &mut Vec::new())?;
        finish(self);
        Ok(self)
    }

    /// Current value of every parameter in declaration order, defaults included.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.registry.param_names().enumerate().map(|(index, name)| (name, self.slot(index)))
    }

    /// Snapshot of all parameters as one mapping.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Map(self.values().map(|(name, value)| (name.to_owned(), value.clone())).collect())
    }

    fn slot(&self, index: usize) -> &Value {
        let Some(slot) = self.values.get(index) else {
            return Value::null_ref();
        };
        match self.registry.spec_at(index) {
            Some(spec) if spec.constraints().has_default() => {
                slot.get_or_init(|| spec.default_value())
            }
            _ => slot.get().unwrap_or(Value::null_ref()),
        }
    }

    fn store(&mut self, index: usize, value: Value, host: &mut dyn Host) -> Result<(), ConfigError> {
        let registry = Arc::clone(&self.registry);
        let spec = registry.spec_at(index).ok_or("parameter slot out of bounds")?;
        let value = spec.validate(value, self.locked, host)?;
        let slot = self.values.get_mut(index).ok_or("parameter slot out of bounds")?;
        *slot = OnceCell::from(value);
        trace!(parameter = spec.name(), "Parameter written");
        Ok(())
    }

    fn apply_source(
        &mut self,
        source: Source,
        host: &mut dyn Host,
        trail: &mut Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        match source {
            Source::Value(document) => self.apply_document(document, host, trail),
            Source::List(sources) => {
                for source in sources {
                    self.apply_source(source, host, trail)?;
                }
                Ok(())
            }
            Source::Path(path) => {
                enter(trail, &path)?;
                debug!(path = %path.display(), "Loading configuration file");
                let document = self
                    .require_loader()?
                    .load_path(&path)
                    .context(format!("Loading {}", path.display()))?;
                self.apply_document(document, host, trail)?;
                trail.pop();
                Ok(())
            }
            Source::Reader { mut reader, format } => {
                debug!(?format, "Loading configuration stream");
                let document = self.require_loader()?.load_reader(&mut reader, format)?;
                self.apply_document(document, host, trail)
            }
        }
    }

    fn apply_document(
        &mut self,
        document: Value,
        host: &mut dyn Host,
        trail: &mut Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        match document {
            Value::Map(entries) => self.apply_entries(entries, host, trail),
            Value::Seq(items) => {
                for item in items {
                    self.apply_nested(item, host, trail)?;
                }
                Ok(())
            }
            other => Err(ConfigError::unsupported(format!(
                "expected a mapping or a sequence, found {}",
                other.type_name()
            ))),
        }
    }

    fn apply_entries(
        &mut self,
        entries: Map,
        host: &mut dyn Host,
        trail: &mut Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        for (key, value) in entries {
            if key == OPTIONS_SOURCE {
                self.apply_nested(value, host, trail)?;
                continue;
            }
            let index = self.registry.index_of(&key)?;
            self.store(index, value, host)?;
        }
        Ok(())
    }

    /// Nested sources may also name a file.
    fn apply_nested(
        &mut self,
        value: Value,
        host: &mut dyn Host,
        trail: &mut Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        match value {
            Value::Str(path) => self.apply_source(Source::Path(PathBuf::from(path)), host, trail),
            other => self.apply_document(other, host, trail),
        }
    }

    fn require_loader(&self) -> Result<Arc<dyn SourceLoader>, ConfigError> {
        self.loader.clone().ok_or_else(|| {
            ConfigError::unsupported("external media need a source loader on the configuration")
        })
    }
}

/// Pushes `path` onto the files being applied, refusing cycles and runaway nesting.
fn enter(trail: &mut Vec<PathBuf>, path: &Path) -> Result<(), ConfigError> {
    if trail.iter().any(|open| open == path) {
        let chain = trail
            .iter()
            .map(|open| open.display().to_string())
            .chain(std::iter::once(path.display().to_string()))
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(ConfigError::SourceCycle {
            path: path.to_path_buf(),
            chain: chain.into(),
            context: None,
        });
    }
    if trail.len() >= MAX_NESTED_FILES {
        return Err(ConfigError::unsupported(format!(
            "more than {MAX_NESTED_FILES} nested files at {}",
            path.display()
        )));
    }
    trail.push(path.to_path_buf());
    Ok(())
}
