//! Registry-backed [`ApiService`]

use super::{ModelRegistry, RegistryError};
use crate::ports::api_service::{ApiKeyResolver, ApiService};
use crate::ports::llm_client::LlmClient;
use async_trait::async_trait;
use council_domain::{GenerationResult, ModelParameters, ProviderError, ResponseIssue};
use std::sync::Arc;
use tracing::debug;

/// Facade composing the registry with API-key resolution and response
/// interpretation
pub struct RegistryApiService {
    registry: Arc<ModelRegistry>,
    keys: Arc<dyn ApiKeyResolver>,
}

impl RegistryApiService {
    pub fn new(registry: Arc<ModelRegistry>, keys: Arc<dyn ApiKeyResolver>) -> Self {
        Self { registry, keys }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Explicit key first, then the provider's key source. Providers
    /// without a key source (local servers) get an empty key.
    fn resolve_api_key(
        &self,
        explicit: Option<&str>,
        provider: &str,
    ) -> Result<String, RegistryError> {
        if let Some(key) = explicit.filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }

        match self.registry.api_key_env_for(provider) {
            Some(env_var) => match self.keys.resolve(&env_var) {
                Some(key) if !key.trim().is_empty() => Ok(key),
                _ => Err(RegistryError::MissingApiKey {
                    provider: provider.to_string(),
                    env_var,
                }),
            },
            None => {
                debug!(provider, "No API key source configured");
                Ok(String::new())
            }
        }
    }
}

#[async_trait]
impl ApiService for RegistryApiService {
    async fn init_client(
        &self,
        api_key: Option<&str>,
        model_name: &str,
        endpoint: Option<&str>,
    ) -> Result<Box<dyn LlmClient>, RegistryError> {
        let model = self.registry.get_model(model_name)?;
        let key = self.resolve_api_key(api_key, &model.provider)?;
        self.registry
            .create_client_with_endpoint(&key, model_name, endpoint)
            .await
    }

    fn get_model_parameters(&self, model_name: &str) -> Result<ModelParameters, RegistryError> {
        self.registry.get_model_parameters(model_name)
    }

    fn process_response(&self, result: GenerationResult) -> Result<String, ProviderError> {
        if result.has_content() {
            return Ok(result.content);
        }
        if result.is_safety_blocked() {
            let reason = result
                .safety
                .iter()
                .filter(|r| r.blocked)
                .map(|r| r.category.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let message = if reason.is_empty() {
                "response blocked by safety filters".to_string()
            } else {
                format!("response blocked by safety filters ({reason})")
            };
            return Err(ProviderError::safety_blocked(message));
        }

        let mut err = ProviderError::empty_response("model returned an empty response");
        if let Some(reason) = result.finish_reason {
            err = err.with_details(format!("finish_reason={reason}"));
        }
        Err(err)
    }

    fn is_empty_response_error(&self, err: &ProviderError) -> bool {
        err.issue == Some(ResponseIssue::Empty)
    }

    fn is_safety_blocked_error(&self, err: &ProviderError) -> bool {
        err.issue == Some(ResponseIssue::SafetyBlocked)
    }

    fn get_error_details(&self, err: &ProviderError) -> String {
        match &err.details {
            Some(details) if !details.is_empty() => format!("{err} ({details})"),
            _ => err.to_string(),
        }
    }
}
