use crate::error::ConfigError;
use crate::value::Value;

/// The owner of a configuration, as seen by `convert` constraints that name a method.
///
/// Any `FnMut(&str, Value) -> Result<Value, ConfigError>` closure is a host answering every
/// method name.
///
/// ```rust
/// use confkit_core::{ConfigError, Configuration, Constraints, ParameterRegistry, Value};
///
/// let registry = ParameterRegistry::builder()
///     .param("name", Constraints::new().convert("upcase"))
///     .build();
/// let mut config = Configuration::new(registry);
///
/// let mut host = |method: &str, value: Value| -> Result<Value, ConfigError> {
///     match (method, value) {
///         ("upcase", Value::Str(s)) => Ok(Value::Str(s.to_uppercase())),
///         (_, other) => Ok(other),
///     }
/// };
/// config.set_with("name", "svc", &mut host)?;
/// assert_eq!(config.get("name")?, &Value::from("SVC"));
/// # Ok::<(), ConfigError>(())
/// ```
pub trait Host {
    /// Invokes `method` on the owner with the value being written.
    ///
    /// # Errors
    /// Whatever the method reports; the error reaches the caller of the write unchanged.
    fn call(&mut self, method: &str, value: Value) -> Result<Value, ConfigError>;

    fn responds_to(&self, _method: &str) -> bool {
        true
    }
}

impl<F> Host for F
where
    F: FnMut(&str, Value) -> Result<Value, ConfigError>,
{
    fn call(&mut self, method: &str, value: Value) -> Result<Value, ConfigError> {
        self(method, value)
    }
}

/// A host without methods. Used by writes that were not given an owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl Host for NoHost {
    fn call(&mut self, method: &str, _value: Value) -> Result<Value, ConfigError> {
        Err(ConfigError::Internal {
            message: format!("no host to call `{method}` on").into(),
            context: None,
        })
    }

    fn responds_to(&self, _method: &str) -> bool {
        false
    }
}
