//! Shared utilities for use cases.
//!
//! Contains cancellation checking, the cancellable generation step and error
//! interpretation used by both [`ModelProcessor`](super::process_model::ModelProcessor)
//! and [`SynthesisService`](super::synthesize::SynthesisService).

use crate::context::RunContext;
use crate::ports::api_service::ApiService;
use crate::ports::audit_logger::{AuditLogger, AuditStatus};
use crate::ports::llm_client::LlmClient;
use crate::registry::RegistryError;
use council_domain::{ErrorCategory, FailureKind, ModelError, ModelParameters, ProviderError};
use serde_json::{Value, json};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, warn};

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(ctx: &RunContext, model: &str) -> Result<(), ModelError> {
    if ctx.is_cancelled() {
        return Err(ModelError::cancelled(model));
    }
    Ok(())
}

/// Race `fut` against the run's cancellation token.
///
/// Returns `None` if the token fired first; `fut` is dropped in that case.
pub(crate) async fn cancellable<F: Future>(ctx: &RunContext, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => None,
        out = fut => Some(out),
    }
}

/// Record an audit entry; failures are logged and swallowed.
pub(crate) fn audit(
    logger: &dyn AuditLogger,
    ctx: &RunContext,
    operation: &str,
    status: AuditStatus,
    inputs: Value,
    outputs: Value,
    error: Option<&str>,
) {
    if let Err(e) = logger.log_op(ctx, operation, status, inputs, outputs, error) {
        warn!(operation, status = status.as_str(), "Failed to write audit entry: {}", e);
    }
}

/// Closes the wrapped client when dropped, on every exit path.
pub(crate) struct ClientGuard {
    client: Box<dyn LlmClient>,
}

impl ClientGuard {
    pub(crate) fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }
}

impl std::ops::Deref for ClientGuard {
    type Target = dyn LlmClient;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref()
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        if let Err(e) = self.client.close() {
            debug!(model = self.client.model_name(), "Client close failed: {}", e);
        }
    }
}

/// Wrap a client-construction failure as `ModelInitializationFailed`
pub(crate) fn init_error(model: &str, err: &RegistryError) -> ModelError {
    let mut error = ModelError::new(FailureKind::ModelInitializationFailed, model, err.to_string());
    if let Some(provider_err) = err.provider_error() {
        error = error.with_category(provider_err.category);
    }
    error
}

/// Translate a provider error into exactly one sentinel.
///
/// Category-specific sentinels win; anything else falls back to `fallback`
/// (`ModelProcessingFailed` for call failures, `InvalidModelResponse` for
/// unusable responses). The detail string is logged on every branch.
pub(crate) fn interpret_error(
    api: &dyn ApiService,
    model: &str,
    err: &ProviderError,
    fallback: FailureKind,
) -> ModelError {
    let details = api.get_error_details(err);

    let kind = if api.is_empty_response_error(err) {
        FailureKind::EmptyModelResponse
    } else if api.is_safety_blocked_error(err) {
        FailureKind::ContentFiltered
    } else {
        match err.category {
            ErrorCategory::ContentFiltered => FailureKind::ContentFiltered,
            ErrorCategory::RateLimit => FailureKind::ModelRateLimited,
            ErrorCategory::InputLimit => FailureKind::ModelTokenLimitExceeded,
            ErrorCategory::Cancelled => FailureKind::Cancelled,
            ErrorCategory::Unknown
            | ErrorCategory::Auth
            | ErrorCategory::InvalidRequest
            | ErrorCategory::NotFound
            | ErrorCategory::Server
            | ErrorCategory::Network
            | ErrorCategory::InsufficientCredits => fallback,
        }
    };

    warn!(
        model,
        kind = kind.as_str(),
        category = err.category.as_str(),
        "{}",
        details
    );
    ModelError::new(kind, model, details).with_category(err.category)
}

/// One audited, cancellable generate call followed by response
/// interpretation.
pub(crate) struct Generation<'a> {
    pub api: &'a dyn ApiService,
    pub audit: &'a dyn AuditLogger,
    pub operation: &'a str,
}

impl Generation<'_> {
    pub(crate) async fn run(
        &self,
        ctx: &RunContext,
        client: &dyn LlmClient,
        model: &str,
        prompt: &str,
        params: &ModelParameters,
    ) -> Result<String, ModelError> {
        let inputs = json!({
            "model": model,
            "prompt_length": prompt.len(),
            "parameters": params,
        });
        audit(
            self.audit,
            ctx,
            self.operation,
            AuditStatus::InProgress,
            inputs.clone(),
            Value::Null,
            None,
        );

        let started = Instant::now();
        let outcome = cancellable(ctx, client.generate(prompt, params)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            None => Err(ProviderError::cancelled()),
            Some(result) => result,
        };

        match result {
            Ok(raw) => {
                audit(
                    self.audit,
                    ctx,
                    self.operation,
                    AuditStatus::Success,
                    inputs,
                    json!({
                        "duration_ms": duration_ms,
                        "finish_reason": raw.finish_reason,
                        "content_length": raw.content.len(),
                        "truncated": raw.truncated,
                    }),
                    None,
                );
                debug!(model, duration_ms, "Generation completed");
                self.api
                    .process_response(raw)
                    .map_err(|e| interpret_error(self.api, model, &e, FailureKind::InvalidModelResponse))
            }
            Err(e) => {
                let error = interpret_error(self.api, model, &e, FailureKind::ModelProcessingFailed);
                audit(
                    self.audit,
                    ctx,
                    self.operation,
                    AuditStatus::Failure,
                    inputs,
                    json!({ "duration_ms": duration_ms }),
                    Some(&error.to_string()),
                );
                Err(error)
            }
        }
    }
}
