//! Process Model use case
//!
//! Runs one model's full request lifecycle: client acquisition, parameter
//! resolution, generation, response interpretation and output persistence.

use crate::context::RunContext;
use crate::ports::api_service::ApiService;
use crate::ports::audit_logger::{AuditLogger, AuditStatus};
use crate::ports::file_writer::FileWriter;
use crate::use_cases::shared::{
    ClientGuard, Generation, audit, cancellable, check_cancelled, init_error,
};
use council_domain::{FailureKind, ModelError, ModelParameters, sanitize_filename};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const GENERATE_OPERATION: &str = "GenerateContent";
pub const SAVE_OPERATION: &str = "SaveOutput";

/// Executes the per-model pipeline
pub struct ModelProcessor {
    api: Arc<dyn ApiService>,
    writer: Arc<dyn FileWriter>,
    audit: Arc<dyn AuditLogger>,
    output_dir: PathBuf,
    api_key: Option<String>,
    endpoint: Option<String>,
}

impl ModelProcessor {
    pub fn new(
        api: Arc<dyn ApiService>,
        writer: Arc<dyn FileWriter>,
        audit: Arc<dyn AuditLogger>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api,
            writer,
            audit,
            output_dir: output_dir.into(),
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

    /// Where the output of `model_name` is written
    pub fn output_path(&self, model_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.md", sanitize_filename(model_name)))
    }

    /// Run `prompt` against `model_name` and persist the answer.
    ///
    /// Returns the generated text; the file lives at
    /// [`output_path`](Self::output_path).
    pub async fn process(
        &self,
        ctx: &RunContext,
        model_name: &str,
        prompt: &str,
    ) -> Result<String, ModelError> {
        check_cancelled(ctx, model_name)?;

        // 1. Client acquisition
        let client = match cancellable(
            ctx,
            self.api
                .init_client(self.api_key.as_deref(), model_name, self.endpoint.as_deref()),
        )
        .await
        {
            None => return Err(ModelError::cancelled(model_name)),
            Some(Ok(client)) => ClientGuard::new(client),
            Some(Err(e)) => return Err(init_error(model_name, &e)),
        };

        // 2. Parameter resolution
        let params = self.resolve_parameters(model_name);

        // 3-4. Generation and interpretation
        let generation = Generation {
            api: self.api.as_ref(),
            audit: self.audit.as_ref(),
            operation: GENERATE_OPERATION,
        };
        let content = generation
            .run(ctx, &*client, model_name, prompt, &params)
            .await?;
        drop(client);

        // 5. Output persistence
        let path = self.output_path(model_name);
        self.save(ctx, model_name, &content, &path).await?;

        info!(model = model_name, path = %path.display(), "Model output saved");
        Ok(content)
    }

    /// Declared parameter defaults. A lookup failure is not fatal; the call
    /// proceeds with provider defaults.
    fn resolve_parameters(&self, model_name: &str) -> ModelParameters {
        match self.api.get_model_parameters(model_name) {
            Ok(params) => params,
            Err(e) => {
                // TODO: decide whether a missing parameter schema should fail the model
                debug!(model = model_name, "Using empty parameters: {}", e);
                ModelParameters::new()
            }
        }
    }

    async fn save(
        &self,
        ctx: &RunContext,
        model_name: &str,
        content: &str,
        path: &Path,
    ) -> Result<(), ModelError> {
        save_output(
            self.writer.as_ref(),
            self.audit.as_ref(),
            ctx,
            model_name,
            content,
            path,
        )
        .await
    }
}

/// Audited, cancellable write of one output file
pub(crate) async fn save_output(
    writer: &dyn FileWriter,
    audit_logger: &dyn AuditLogger,
    ctx: &RunContext,
    model_name: &str,
    content: &str,
    path: &Path,
) -> Result<(), ModelError> {
    let inputs = json!({
        "model": model_name,
        "path": path.display().to_string(),
        "content_length": content.len(),
    });
    audit(
        audit_logger,
        ctx,
        SAVE_OPERATION,
        AuditStatus::InProgress,
        inputs.clone(),
        Value::Null,
        None,
    );

    let started = Instant::now();
    let outcome = cancellable(ctx, writer.save_to_file(content, path)).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    let error = match outcome {
        Some(Ok(())) => {
            audit(
                audit_logger,
                ctx,
                SAVE_OPERATION,
                AuditStatus::Success,
                inputs,
                json!({ "duration_ms": duration_ms }),
                None,
            );
            return Ok(());
        }
        Some(Err(e)) => ModelError::new(FailureKind::OutputWriteFailed, model_name, e.to_string()),
        None => ModelError::cancelled(model_name),
    };

    audit(
        audit_logger,
        ctx,
        SAVE_OPERATION,
        AuditStatus::Failure,
        inputs,
        json!({ "duration_ms": duration_ms }),
        Some(&error.to_string()),
    );
    Err(error)
}
