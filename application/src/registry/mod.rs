//! Model registry
//!
//! Single source of truth for provider and model metadata plus the
//! client-construction capability bound to each provider.
//!
//! The registry is an explicitly constructed instance shared through `Arc`.
//! It is populated once at startup by [`ModelRegistry::initialize`], which
//! falls back through three tiers so the system is always usable:
//!
//! 1. File-based configuration
//! 2. A single-model configuration built from environment variables
//! 3. The embedded default catalog
//!
//! After that it is only read, from many tasks at once.

mod api_service;
mod error;

pub use api_service::RegistryApiService;
pub use error::RegistryError;

use crate::ports::config_loader::ModelsConfigLoader;
use crate::ports::llm_client::{LlmClient, ProviderImplementation};
use council_domain::{ModelDefinition, ModelInfo, ModelParameters, ModelsConfig, ProviderDefinition};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Which tier populated the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Environment,
    Embedded,
    /// `initialize` was called on an already-loaded registry
    AlreadyLoaded,
}

#[derive(Default)]
struct RegistryState {
    models: HashMap<String, ModelDefinition>,
    providers: HashMap<String, ProviderDefinition>,
    implementations: HashMap<String, Arc<dyn ProviderImplementation>>,
    api_key_sources: BTreeMap<String, String>,
}

/// Registry of configured providers and models
#[derive(Default)]
pub struct ModelRegistry {
    state: RwLock<RegistryState>,
    loaded: AtomicBool,
    init_lock: Mutex<()>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with `config`
    pub fn from_config(config: ModelsConfig) -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.apply(config)?;
        Ok(registry)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load, validate and install a configuration from `loader`.
    ///
    /// On any error the previous state is left untouched.
    pub fn load(&self, loader: &dyn ModelsConfigLoader) -> Result<(), RegistryError> {
        let config = loader.load().map_err(|source| RegistryError::Load {
            source_name: loader.source_name().to_string(),
            source,
        })?;
        self.apply(config)
    }

    fn apply(&self, config: ModelsConfig) -> Result<(), RegistryError> {
        config.validate()?;

        let providers: HashMap<_, _> = config
            .providers
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        let models: HashMap<_, _> = config
            .models
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect();

        let mut state = self.write();
        // Bindings survive a reload as long as their provider still exists
        state
            .implementations
            .retain(|name, _| providers.contains_key(name));
        info!(
            providers = providers.len(),
            models = models.len(),
            "Model registry loaded"
        );
        state.providers = providers;
        state.models = models;
        state.api_key_sources = config.api_key_sources;
        drop(state);

        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Populate the registry once, falling back file -> environment ->
    /// embedded defaults. Subsequent calls are no-ops.
    pub fn initialize(
        &self,
        file_loader: &dyn ModelsConfigLoader,
        env_loader: &dyn ModelsConfigLoader,
    ) -> Result<ConfigSource, RegistryError> {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_loaded() {
            debug!("Model registry already initialized");
            return Ok(ConfigSource::AlreadyLoaded);
        }

        match self.load(file_loader) {
            Ok(()) => return Ok(ConfigSource::File),
            Err(e) => debug!("File configuration unavailable: {}", e),
        }

        match self.load(env_loader) {
            Ok(()) => {
                info!("Using model configuration from environment variables");
                return Ok(ConfigSource::Environment);
            }
            Err(e) => debug!("Environment configuration unavailable: {}", e),
        }

        warn!("No model configuration found, using embedded defaults");
        self.apply(ModelsConfig::embedded_default())?;
        Ok(ConfigSource::Embedded)
    }

    pub fn get_model(&self, name: &str) -> Result<ModelDefinition, RegistryError> {
        self.read()
            .models
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ModelUnknown(name.to_string()))
    }

    pub fn get_provider(&self, name: &str) -> Result<ProviderDefinition, RegistryError> {
        self.read()
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ProviderUnknown(name.to_string()))
    }

    /// Bind a client-construction capability to a configured provider
    pub fn register_provider_implementation(
        &self,
        provider: &str,
        implementation: Arc<dyn ProviderImplementation>,
    ) -> Result<(), RegistryError> {
        let mut state = self.write();
        if !state.providers.contains_key(provider) {
            return Err(RegistryError::ProviderUnknown(provider.to_string()));
        }
        debug!(provider, "Registered provider implementation");
        state
            .implementations
            .insert(provider.to_string(), implementation);
        Ok(())
    }

    pub fn has_implementation(&self, provider: &str) -> bool {
        self.read().implementations.contains_key(provider)
    }

    /// Compose model, provider and implementation into a ready client
    pub async fn create_client(
        &self,
        api_key: &str,
        model_name: &str,
    ) -> Result<Box<dyn LlmClient>, RegistryError> {
        self.create_client_with_endpoint(api_key, model_name, None)
            .await
    }

    /// Like [`create_client`](Self::create_client), with an optional base
    /// URL overriding the provider's configured one.
    pub async fn create_client_with_endpoint(
        &self,
        api_key: &str,
        model_name: &str,
        endpoint: Option<&str>,
    ) -> Result<Box<dyn LlmClient>, RegistryError> {
        // Resolve everything under the read lock, then release it before
        // awaiting the provider.
        let (model, provider, implementation) = {
            let state = self.read();
            let model = state
                .models
                .get(model_name)
                .cloned()
                .ok_or_else(|| RegistryError::ModelUnknown(model_name.to_string()))?;
            let provider = state
                .providers
                .get(&model.provider)
                .cloned()
                .ok_or_else(|| RegistryError::ProviderUnknown(model.provider.clone()))?;
            let implementation = state
                .implementations
                .get(&model.provider)
                .cloned()
                .ok_or_else(|| RegistryError::ProviderUnregistered(model.provider.clone()))?;
            (model, provider, implementation)
        };

        let base_url = endpoint.or(provider.base_url.as_deref());
        debug!(
            model = %model.name,
            provider = %provider.name,
            api_model_id = %model.api_model_id,
            "Creating client"
        );

        implementation
            .create_client(api_key, &model.api_model_id, base_url)
            .await
            .map_err(|source| RegistryError::ClientCreation {
                provider: provider.name.clone(),
                source,
            })
    }

    /// Declared parameter defaults of a model
    pub fn get_model_parameters(&self, name: &str) -> Result<ModelParameters, RegistryError> {
        self.get_model(name).map(|m| m.default_parameters())
    }

    /// All model names, sorted
    pub fn get_all_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_model_info(&self, name: &str) -> Result<ModelInfo, RegistryError> {
        self.get_model(name).map(|m| m.info())
    }

    pub fn is_model_supported(&self, name: &str) -> bool {
        self.read().models.contains_key(name)
    }

    /// Environment variable holding the API key for `provider`
    pub fn api_key_env_for(&self, provider: &str) -> Option<String> {
        self.read().api_key_sources.get(provider).cloned()
    }

    /// Names of configured providers, sorted
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().providers.keys().cloned().collect();
        names.sort();
        names
    }
}
