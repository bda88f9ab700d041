//! LLM client port
//!
//! Defines the interface for talking to one model on one provider, and the
//! per-provider capability that constructs such clients.

use async_trait::async_trait;
use council_domain::{GenerationResult, ModelParameters, ProviderError};

/// A ready-to-use client bound to a single model
///
/// Implementations (adapters) live in the infrastructure layer. Every error
/// they return must already carry its [`ErrorCategory`](council_domain::ErrorCategory).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider-side identifier of the model this client talks to
    fn model_name(&self) -> &str;

    /// Generate text for `prompt` with the resolved parameters
    async fn generate(
        &self,
        prompt: &str,
        params: &ModelParameters,
    ) -> Result<GenerationResult, ProviderError>;

    /// Release resources held by this client.
    ///
    /// Called exactly once when the caller is done with the client, on
    /// every exit path.
    fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Client-construction capability bound to a provider name in the registry
#[async_trait]
pub trait ProviderImplementation: Send + Sync {
    async fn create_client(
        &self,
        api_key: &str,
        api_model_id: &str,
        base_url: Option<&str>,
    ) -> Result<Box<dyn LlmClient>, ProviderError>;
}
