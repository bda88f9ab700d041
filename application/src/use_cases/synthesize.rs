//! Synthesize use case
//!
//! Merges every successful model output into one document through a
//! designated synthesis model.

use crate::context::RunContext;
use crate::ports::api_service::ApiService;
use crate::ports::audit_logger::AuditLogger;
use crate::use_cases::shared::{ClientGuard, Generation, cancellable, check_cancelled, init_error};
use council_domain::{FailureKind, ModelError, ModelParameters, PromptTemplate};
use std::sync::Arc;
use tracing::{debug, info};

pub const SYNTHESIZE_OPERATION: &str = "SynthesizeResults";

pub struct SynthesisService {
    api: Arc<dyn ApiService>,
    audit: Arc<dyn AuditLogger>,
    api_key: Option<String>,
    endpoint: Option<String>,
}

impl SynthesisService {
    pub fn new(api: Arc<dyn ApiService>, audit: Arc<dyn AuditLogger>) -> Self {
        Self {
            api,
            audit,
            api_key: None,
            endpoint: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Combine `outputs` (model name, content) into a single answer.
    ///
    /// Outputs are presented to the synthesis model in name order, so the
    /// prompt does not depend on which task finished first.
    pub async fn synthesize(
        &self,
        ctx: &RunContext,
        synthesis_model: &str,
        instructions: &str,
        outputs: &[(String, String)],
    ) -> Result<String, ModelError> {
        self.run(ctx, synthesis_model, instructions, outputs)
            .await
            .map_err(|e| {
                let guidance = guidance_for(e.kind, synthesis_model);
                e.with_guidance(&guidance)
            })
    }

    async fn run(
        &self,
        ctx: &RunContext,
        model: &str,
        instructions: &str,
        outputs: &[(String, String)],
    ) -> Result<String, ModelError> {
        check_cancelled(ctx, model)?;
        if outputs.is_empty() {
            return Err(ModelError::new(
                FailureKind::ModelProcessingFailed,
                model,
                "no successful outputs to synthesize",
            ));
        }

        let mut ordered = outputs.to_vec();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));
        let prompt = PromptTemplate::synthesis_prompt(instructions, &ordered);
        info!(model, inputs = ordered.len(), "Synthesizing results");

        let client = match cancellable(
            ctx,
            self.api
                .init_client(self.api_key.as_deref(), model, self.endpoint.as_deref()),
        )
        .await
        {
            None => return Err(ModelError::cancelled(model)),
            Some(Ok(client)) => ClientGuard::new(client),
            Some(Err(e)) => return Err(init_error(model, &e)),
        };

        let params = self.api.get_model_parameters(model).unwrap_or_else(|e| {
            debug!(model, "Using empty parameters for synthesis: {}", e);
            ModelParameters::new()
        });

        Generation {
            api: self.api.as_ref(),
            audit: self.audit.as_ref(),
            operation: SYNTHESIZE_OPERATION,
        }
        .run(ctx, &*client, model, &prompt, &params)
        .await
    }
}

/// User-facing hint appended to every synthesis error
fn guidance_for(kind: FailureKind, model: &str) -> String {
    match kind {
        FailureKind::ModelInitializationFailed
        | FailureKind::ModelUnknown
        | FailureKind::ProviderUnregistered
        | FailureKind::ConfigurationInvalid => format!(
            "Check that synthesis model '{model}' is configured and its provider API key is set"
        ),
        FailureKind::ContentFiltered => format!(
            "Synthesis model '{model}' declined to combine the outputs; try a different synthesis model"
        ),
        FailureKind::ModelTokenLimitExceeded => format!(
            "The combined outputs exceed the context window of '{model}'; use a synthesis model with a larger context window or fewer models"
        ),
        FailureKind::ModelRateLimited => {
            format!("Synthesis model '{model}' is rate limited; retry later")
        }
        FailureKind::EmptyModelResponse => {
            format!("Synthesis model '{model}' returned nothing; retry or pick another synthesis model")
        }
        FailureKind::Cancelled => format!("Synthesis with '{model}' was cancelled"),
        FailureKind::ModelProcessingFailed
        | FailureKind::InvalidModelResponse
        | FailureKind::OutputWriteFailed => format!(
            "Synthesis with '{model}' failed; the individual model outputs are still available"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::audit_logger::AuditStatus;
    use crate::use_cases::process_model::tests::{MockApiService, RecordingAuditLogger, Script};
    use council_domain::{ErrorCategory, ProviderError};
    use std::sync::atomic::Ordering;

    fn outputs() -> Vec<(String, String)> {
        vec![
            ("m2".to_string(), "B".to_string()),
            ("m1".to_string(), "A".to_string()),
        ]
    }

    #[tokio::test]
    async fn test_synthesize_orders_outputs_by_model() {
        let api = Arc::new(MockApiService::new(&[("s1", Script::Reply("Combined(A,B)".into()))]));
        let audit = Arc::new(RecordingAuditLogger::default());
        let service = SynthesisService::new(api.clone(), audit.clone());

        let text = service
            .synthesize(&RunContext::default(), "s1", "Compare these", &outputs())
            .await
            .unwrap();

        assert_eq!(text, "Combined(A,B)");
        let prompt = api.prompt_for("s1").unwrap();
        assert!(prompt.contains("Compare these"));
        let a = prompt.find("model=\"m1\"").unwrap();
        let b = prompt.find("model=\"m2\"").unwrap();
        assert!(a < b);
        assert_eq!(
            audit.statuses(SYNTHESIZE_OPERATION),
            vec![AuditStatus::InProgress, AuditStatus::Success]
        );
        assert_eq!(api.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_carry_guidance_and_detail() {
        let api = Arc::new(MockApiService::new(&[(
            "s1",
            Script::Fail(
                ProviderError::new(ErrorCategory::InputLimit, "context length exceeded")
                    .with_details("max 8192 tokens"),
            ),
        )]));
        let service = SynthesisService::new(api, Arc::new(RecordingAuditLogger::default()));

        let err = service
            .synthesize(&RunContext::default(), "s1", "q", &outputs())
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::ModelTokenLimitExceeded);
        assert!(err.detail.contains("context length exceeded"));
        assert!(err.detail.contains("larger context window"));
        assert!(err.detail.contains("'s1'"));
    }

    #[tokio::test]
    async fn test_init_failure_guidance() {
        let api = Arc::new(MockApiService::new(&[("s1", Script::InitFail)]));
        let service = SynthesisService::new(api, Arc::new(RecordingAuditLogger::default()));

        let err = service
            .synthesize(&RunContext::default(), "s1", "q", &outputs())
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::ModelInitializationFailed);
        assert!(err.detail.contains("API key"));
    }

    #[tokio::test]
    async fn test_no_outputs_is_rejected_without_calling_model() {
        let api = Arc::new(MockApiService::new(&[("s1", Script::Reply("x".into()))]));
        let service = SynthesisService::new(api.clone(), Arc::new(RecordingAuditLogger::default()));

        let err = service
            .synthesize(&RunContext::default(), "s1", "q", &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::ModelProcessingFailed);
        assert_eq!(api.calls_for("s1"), 0);
    }
}
