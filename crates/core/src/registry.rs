use crate::constraint::{Constraints, Convert};
use crate::error::ConfigError;
use crate::host::Host;
use crate::value::{TypeTag, Value};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// A declared parameter: its name and the constraints every write goes through.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: Arc<str>,
    constraints: Constraints,
}

impl ParameterSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub(crate) fn default_value(&self) -> Value {
        self.constraints.default.as_ref().map(|d| d.materialize()).unwrap_or_default()
    }

    /// Runs the constraint chain on `value` and returns what should be stored.
    ///
    /// Order: lockable, `not_nil`, `not_empty`, `must_be`, `must_respond_to`, coercion,
    /// `max`, `min`, membership, `convert`. The first failing step ends the write.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] variant of the first failing step.
    pub fn validate(
        &self,
        value: Value,
        locked: bool,
        host: &mut dyn Host,
    ) -> Result<Value, ConfigError> {
        let c = &self.constraints;
        let parameter = || Arc::clone(&self.name);

        if c.lockable && locked {
            return Err(ConfigError::Locked { parameter: parameter(), context: None });
        }
        if c.not_nil && value.is_null() {
            return Err(ConfigError::NullNotAllowed { parameter: parameter(), context: None });
        }
        if c.not_empty && value.is_empty() {
            return Err(ConfigError::EmptyNotAllowed { parameter: parameter(), context: None });
        }
        if let Some(tags) = &c.must_be
            && !tags.iter().any(|tag| tag.matches(&value))
        {
            return Err(ConfigError::TypeConstraint {
                parameter: parameter(),
                message: format!("expected {}, found {}", list_tags(tags), value.type_name())
                    .into(),
                context: None,
            });
        }
        if let Some(capability) = c.must_respond_to.iter().find(|cap| !value.responds_to(cap)) {
            return Err(ConfigError::CapabilityMissing {
                parameter: parameter(),
                capability: capability.clone(),
                context: None,
            });
        }

        let value = match c.coercion {
            Some(coercion) => coercion.apply(value).map_err(|message| ConfigError::Coercion {
                parameter: parameter(),
                message,
                context: None,
            })?,
            None => value,
        };

        if let Some(max) = &c.max {
            check_bound(&value, max, Ordering::Greater, "not more than", parameter)?;
        }
        if let Some(min) = &c.min {
            check_bound(&value, min, Ordering::Less, "not less than", parameter)?;
        }
        if let Some(membership) = &c.membership
            && !membership.contains(&value)
        {
            return Err(ConfigError::Range {
                parameter: parameter(),
                message: format!("`{value}` is not in {membership}").into(),
                context: None,
            });
        }

        match &c.convert {
            Some(Convert::Method(method)) if !host.responds_to(method) => {
                Err(ConfigError::Conversion {
                    parameter: parameter(),
                    message: format!("owner does not respond to `{method}`").into(),
                    context: None,
                })
            }
            Some(Convert::Method(method)) => host.call(method, value),
            Some(Convert::Function(convert)) => convert(value),
            None => Ok(value),
        }
    }
}

fn list_tags(tags: &[TypeTag]) -> String {
    match tags {
        [tag] => tag.to_string(),
        tags => {
            let names: Vec<String> = tags.iter().map(ToString::to_string).collect();
            format!("one of [{}]", names.join(", "))
        }
    }
}

fn check_bound(
    value: &Value,
    bound: &Value,
    rejected: Ordering,
    relation: &str,
    parameter: impl Fn() -> Arc<str>,
) -> Result<(), ConfigError> {
    let message = match value.compare(bound) {
        Some(ordering) if ordering != rejected => return Ok(()),
        Some(_) => format!("must be {relation} {bound}, got {value}"),
        None => format!("cannot compare {} `{value}` with `{bound}`", value.type_name()),
    };
    Err(ConfigError::Range { parameter: parameter(), message: message.into(), context: None })
}

/// Handle to a declared parameter: the accessor pair returned by a declaration.
///
/// Reads and writes through a handle skip the name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    index: usize,
    name: Arc<str>,
}

impl Parameter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// The immutable set of declared parameters of one configurable kind.
///
/// Built once through [`RegistryBuilder`] and shared by every [`Configuration`](crate::Configuration)
/// of that kind.
#[derive(Debug, Default)]
pub struct ParameterRegistry {
    specs: IndexMap<Arc<str>, ParameterSpec>,
}

impl ParameterRegistry {
    #[must_use = "Creates a new registry builder"]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(AsRef::as_ref)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.values()
    }

    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.specs.get(name)
    }

    /// Returns the handle of a declared parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<Parameter> {
        self.specs
            .get_full(name)
            .map(|(index, key, _)| Parameter { index, name: Arc::clone(key) })
    }

    pub(crate) fn index_of(&self, name: &str) -> Result<usize, ConfigError> {
        self.specs.get_index_of(name).ok_or_else(|| ConfigError::unknown(name))
    }

    pub(crate) fn spec_at(&self, index: usize) -> Option<&ParameterSpec> {
        self.specs.get_index(index).map(|(_, spec)| spec)
    }

    /// Resolves a handle, rejecting handles issued by another registry.
    pub(crate) fn resolve(&self, parameter: &Parameter) -> Result<usize, ConfigError> {
        match self.specs.get_index(parameter.index) {
            Some((name, _)) if **name == *parameter.name => Ok(parameter.index),
            _ => Err(ConfigError::unknown(&parameter.name)),
        }
    }
}

/// Collects declarations before they are frozen into a [`ParameterRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    specs: IndexMap<Arc<str>, ParameterSpec>,
}

impl RegistryBuilder {
    #[must_use = "Creates a new registry builder"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a parameter and returns its handle.
    ///
    /// Declaring a name twice replaces the earlier constraints and keeps its position.
    pub fn declare(&mut self, name: impl AsRef<str>, constraints: Constraints) -> Parameter {
        let name: Arc<str> = Arc::from(name.as_ref());
        let spec = ParameterSpec { name: Arc::clone(&name), constraints };
        let (index, previous) = self.specs.insert_full(Arc::clone(&name), spec);
        if previous.is_some() {
            debug!(parameter = %name, "Parameter re-declared, replacing its constraints");
        }
        Parameter { index, name }
    }

    /// Chaining form of [`RegistryBuilder::declare`].
    #[must_use = "Declares a parameter on the builder"]
    pub fn param(mut self, name: impl AsRef<str>, constraints: Constraints) -> Self {
        self.declare(name, constraints);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<ParameterRegistry> {
        debug!(parameters = self.specs.len(), "Parameter registry built");
        Arc::new(ParameterRegistry { specs: self.specs })
    }
}
