use crate::engine::Configuration;
use crate::registry::ParameterRegistry;
use crate::source::SourceLoader;
use private::Sealed;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct NoRegistry;
#[derive(Debug)]
pub struct WithRegistry(Arc<ParameterRegistry>);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRegistry {}
impl Sealed for WithRegistry {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct ConfigurationBuilder<S: Sealed = NoRegistry> {
    state: S,
    loader: Option<Arc<dyn SourceLoader>>,
    locked: bool,
}

#[allow(private_bounds)]
impl<S: Sealed> ConfigurationBuilder<S> {
    #[must_use = "Sets the loader used for file and stream sources"]
    pub fn loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    #[must_use = "Sets a shared loader used for file and stream sources"]
    pub fn shared_loader(mut self, loader: Arc<dyn SourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    #[must_use = "Sets whether the configuration starts locked"]
    pub const fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> ConfigurationBuilder<N> {
        ConfigurationBuilder { state, loader: self.loader, locked: self.locked }
    }
}

impl ConfigurationBuilder<NoRegistry> {
    #[must_use = "Creates a new configuration builder"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the parameter registry of the configuration"]
    pub fn registry(self, registry: Arc<ParameterRegistry>) -> ConfigurationBuilder<WithRegistry> {
        self.transition(WithRegistry(registry))
    }
}

impl ConfigurationBuilder<WithRegistry> {
    /// Creates the configuration with every parameter unset.
    #[must_use]
    pub fn build(self) -> Configuration {
        let mut configuration = Configuration::new(self.state.0);
        configuration.loader = self.loader;
        configuration.locked = self.locked;
        configuration
    }
}
