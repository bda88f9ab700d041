//! API service facade port
//!
//! The model and synthesis pipelines never talk to the registry or provider
//! adapters directly; they go through [`ApiService`], which owns client
//! construction, parameter lookup, response interpretation and the narrow
//! error predicates.

use crate::ports::llm_client::LlmClient;
use crate::registry::RegistryError;
use async_trait::async_trait;
use council_domain::{GenerationResult, ModelParameters, ProviderError};

#[async_trait]
pub trait ApiService: Send + Sync {
    /// Build a client for `model_name`.
    ///
    /// `api_key` overrides the provider's configured key source;
    /// `endpoint` overrides the provider's base URL.
    async fn init_client(
        &self,
        api_key: Option<&str>,
        model_name: &str,
        endpoint: Option<&str>,
    ) -> Result<Box<dyn LlmClient>, RegistryError>;

    /// Declared parameter defaults for `model_name`
    fn get_model_parameters(&self, model_name: &str) -> Result<ModelParameters, RegistryError>;

    /// Turn a raw generation result into text, or an error describing why
    /// the result is unusable
    fn process_response(&self, result: GenerationResult) -> Result<String, ProviderError>;

    fn is_empty_response_error(&self, err: &ProviderError) -> bool;

    fn is_safety_blocked_error(&self, err: &ProviderError) -> bool;

    /// Human-readable detail string used in logs and error messages
    fn get_error_details(&self, err: &ProviderError) -> String;
}

/// Resolves the value of an API-key environment variable
pub trait ApiKeyResolver: Send + Sync {
    fn resolve(&self, env_var: &str) -> Option<String>;
}
