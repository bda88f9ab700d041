//! Provider adapters and their binding to the model registry.

pub mod env_keys;
pub mod openai_compatible;

pub use env_keys::EnvApiKeyResolver;
pub use openai_compatible::{OpenAiCompatibleClient, OpenAiCompatibleProvider};

use council_application::{ModelRegistry, ProviderImplementation, RegistryError};
use std::sync::Arc;
use tracing::debug;

/// Bind `implementation` to every provider the registry knows about.
///
/// Returns the bound provider names, sorted.
pub fn register_all_providers(
    registry: &ModelRegistry,
    implementation: Arc<dyn ProviderImplementation>,
) -> Result<Vec<String>, RegistryError> {
    let providers = registry.provider_names();
    for provider in &providers {
        registry.register_provider_implementation(provider, Arc::clone(&implementation))?;
    }
    debug!(count = providers.len(), "Bound provider implementations");
    Ok(providers)
}

/// Bind the OpenAI-compatible adapter to every configured provider
pub fn register_default_providers(registry: &ModelRegistry) -> Result<Vec<String>, RegistryError> {
    register_all_providers(registry, Arc::new(OpenAiCompatibleProvider::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::ModelsConfig;

    #[test]
    fn test_register_default_providers_binds_every_provider() {
        let registry = ModelRegistry::from_config(ModelsConfig::embedded_default()).unwrap();

        let bound = register_default_providers(&registry).unwrap();

        assert_eq!(bound, vec!["openai".to_string(), "openrouter".to_string()]);
        assert!(bound.iter().all(|p| registry.has_implementation(p)));
    }

    #[test]
    fn test_register_on_empty_registry_binds_nothing() {
        let registry = ModelRegistry::new();
        assert!(register_default_providers(&registry).unwrap().is_empty());
    }
}
