use crate::engine::Configuration;
use crate::error::ConfigError;
use crate::registry::{ParameterRegistry, RegistryBuilder};
use std::sync::Arc;

/// A statically declared parameter set, usually implemented with `#[derive(Parameters)]`.
pub trait Parameters: Sized {
    /// Declares every parameter of the set on `registry`.
    fn declare(registry: &mut RegistryBuilder);

    /// The registry of this set, built on first use.
    fn registry() -> Arc<ParameterRegistry>;

    /// Reads the whole set back from a configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Extract`] for the first field whose stored value has another shape.
    fn extract(configuration: &Configuration) -> Result<Self, ConfigError>;

    /// A fresh configuration over this set.
    #[must_use]
    fn configuration() -> Configuration {
        Configuration::new(Self::registry())
    }
}

/// A type that owns a [`Configuration`] and exposes bulk configuration on itself.
pub trait Configurable {
    fn configuration(&self) -> &Configuration;

    fn configuration_mut(&mut self) -> &mut Configuration;

    /// Bulk-applies a source to the owned configuration.
    ///
    /// # Errors
    /// See [`Configuration::configure`].
    fn configure(
        &mut self,
        source: impl Into<crate::source::Source>,
    ) -> Result<&mut Self, ConfigError>
    where
        Self: Sized,
    {
        self.configuration_mut().configure(source)?;
        Ok(self)
    }

    /// Bulk-applies a source, then runs `finish` on the owner.
    ///
    /// # Errors
    /// See [`Configuration::configure`]. `finish` is not run on error.
    fn configure_then<F>(
        &mut self,
        source: impl Into<crate::source::Source>,
        finish: F,
    ) -> Result<&mut Self, ConfigError>
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        self.configuration_mut().configure(source)?;
        finish(self);
        Ok(self)
    }

    fn lock(&mut self) {
        self.configuration_mut().lock();
    }

    fn unlock(&mut self) {
        self.configuration_mut().unlock();
    }
}
