//! Run Orchestration use case
//!
//! Fans one set of instructions out to every requested model concurrently,
//! aggregates the per-model results and optionally synthesizes them.

use crate::config::RunParams;
use crate::context::RunContext;
use crate::ports::api_service::ApiService;
use crate::ports::audit_logger::{AuditLogger, AuditStatus};
use crate::ports::file_writer::FileWriter;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::rate_limit::{RateLimitError, RateLimiter};
use crate::registry::ModelRegistry;
use crate::use_cases::process_model::{ModelProcessor, save_output};
use crate::use_cases::shared::audit;
use crate::use_cases::synthesize::SynthesisService;
use council_domain::{
    FailureKind, Instructions, ModelError, ProcessingResult, RunPhase, RunResult, RunStatus,
    RunSummary, RunTracker, SynthesisOutcome, TaskState, sanitize_filename,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

pub const RUN_OPERATION: &str = "ExecuteRun";

/// Errors that end a run without a result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No models requested")]
    NoModels,

    #[error("Run cancelled")]
    Cancelled,
}

/// Use case for running one fan-out
pub struct Orchestrator {
    registry: Arc<ModelRegistry>,
    limiter: Arc<RateLimiter>,
    processor: Arc<ModelProcessor>,
    synthesis: SynthesisService,
    writer: Arc<dyn FileWriter>,
    audit: Arc<dyn AuditLogger>,
    params: RunParams,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        api: Arc<dyn ApiService>,
        writer: Arc<dyn FileWriter>,
        audit: Arc<dyn AuditLogger>,
        limiter: Arc<RateLimiter>,
        params: RunParams,
    ) -> Self {
        let processor = ModelProcessor::new(
            Arc::clone(&api),
            Arc::clone(&writer),
            Arc::clone(&audit),
            params.output_dir.clone(),
        )
        .with_api_key(params.api_key.clone())
        .with_endpoint(params.endpoint.clone());

        let synthesis = SynthesisService::new(api, Arc::clone(&audit))
            .with_api_key(params.api_key.clone())
            .with_endpoint(params.endpoint.clone());

        Self {
            registry,
            limiter,
            processor: Arc::new(processor),
            synthesis,
            writer,
            audit,
            params,
        }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Where the synthesized document is written
    pub fn synthesis_path(&self, model: &str) -> PathBuf {
        self.params
            .output_dir
            .join(format!("{}-synthesis.md", sanitize_filename(model)))
    }

    /// Execute a run with a freshly generated correlation id
    pub async fn run_with_new_context(
        &self,
        cancellation: CancellationToken,
        instructions: &Instructions,
    ) -> Result<RunResult, OrchestratorError> {
        self.run(&RunContext::new(cancellation), instructions).await
    }

    /// Execute a run with default (no-op) progress
    pub async fn run(
        &self,
        ctx: &RunContext,
        instructions: &Instructions,
    ) -> Result<RunResult, OrchestratorError> {
        self.run_with_progress(ctx, instructions, &NoProgress).await
    }

    /// Execute a run with progress callbacks
    pub async fn run_with_progress(
        &self,
        ctx: &RunContext,
        instructions: &Instructions,
        progress: &dyn ProgressNotifier,
    ) -> Result<RunResult, OrchestratorError> {
        let models = self.params.unique_models();
        if models.is_empty() {
            return Err(OrchestratorError::NoModels);
        }
        if ctx.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }

        let span = info_span!("run", correlation_id = %ctx.correlation_id());
        self.execute(ctx, instructions, models, progress)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        instructions: &Instructions,
        models: Vec<String>,
        progress: &dyn ProgressNotifier,
    ) -> Result<RunResult, OrchestratorError> {
        let started = Instant::now();
        let mut tracker = RunTracker::new();
        let run_inputs = json!({
            "models": models,
            "synthesis_model": self.params.synthesis_model(),
            "output_dir": self.params.output_dir.display().to_string(),
            "instructions_length": instructions.content().len(),
        });
        audit(
            self.audit.as_ref(),
            ctx,
            RUN_OPERATION,
            AuditStatus::InProgress,
            run_inputs.clone(),
            Value::Null,
            None,
        );

        info!("Starting run with {} models", models.len());
        advance_phase(&mut tracker, RunPhase::Dispatching);
        progress.on_phase_start(RunPhase::Dispatching, models.len());

        let per_model = self.dispatch(ctx, instructions, &models, progress).await;

        if ctx.is_cancelled() {
            warn!("Run cancelled");
            self.audit_cancelled(ctx, run_inputs);
            return Err(OrchestratorError::Cancelled);
        }

        advance_phase(&mut tracker, RunPhase::Aggregating);
        let succeeded = per_model.iter().filter(|r| r.is_success()).count();
        info!(
            succeeded,
            failed = per_model.len() - succeeded,
            "All model tasks finished"
        );

        let synthesis = match self.params.synthesis_model() {
            Some(model) => {
                if succeeded == 0 {
                    debug!("No successful outputs, skipping synthesis");
                    SynthesisOutcome::Skipped {
                        model: model.to_string(),
                    }
                } else if let Some(owner) = self.path_owner(&models, &self.synthesis_path(model)) {
                    warn!(model, owner = %owner, "Synthesis output path collides with a model output");
                    SynthesisOutcome::Failed {
                        model: model.to_string(),
                        error: ModelError::new(
                            FailureKind::OutputWriteFailed,
                            model,
                            format!(
                                "output path {} is already used by model {owner}",
                                self.synthesis_path(model).display()
                            ),
                        ),
                    }
                } else {
                    advance_phase(&mut tracker, RunPhase::Synthesizing);
                    progress.on_phase_start(RunPhase::Synthesizing, 1);
                    let outcome = self
                        .synthesize(ctx, model, instructions, &per_model)
                        .await;
                    if ctx.is_cancelled() {
                        self.audit_cancelled(ctx, run_inputs);
                        return Err(OrchestratorError::Cancelled);
                    }
                    progress.on_synthesis_complete(model, outcome.is_success());
                    outcome
                }
            }
            None => SynthesisOutcome::NotRequested,
        };

        let status = RunResult::classify(&per_model, &synthesis);
        advance_phase(&mut tracker, match status {
            RunStatus::Success => RunPhase::Done,
            RunStatus::PartialFailure => RunPhase::PartialFailure,
            RunStatus::TotalFailure => RunPhase::TotalFailure,
        });

        let summary = RunSummary {
            attempted: per_model.len(),
            succeeded,
            failed: per_model.len() - succeeded,
            synthesis_attempted: synthesis.was_attempted(),
            synthesis_succeeded: synthesis.is_success(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        audit(
            self.audit.as_ref(),
            ctx,
            RUN_OPERATION,
            if status == RunStatus::TotalFailure {
                AuditStatus::Failure
            } else {
                AuditStatus::Success
            },
            run_inputs,
            json!({
                "attempted": summary.attempted,
                "succeeded": summary.succeeded,
                "failed": summary.failed,
                "synthesis_attempted": summary.synthesis_attempted,
                "synthesis_succeeded": summary.synthesis_succeeded,
                "status": status.as_str(),
                "duration_ms": summary.duration_ms,
            }),
            (status == RunStatus::TotalFailure).then_some("all models failed"),
        );
        info!(status = %status, phase = %tracker.phase(), "Run finished");

        Ok(RunResult {
            correlation_id: ctx.correlation_id().to_string(),
            status,
            per_model,
            synthesis,
            summary,
        })
    }

    /// Spawn one task per model and collect every result in request order
    async fn dispatch(
        &self,
        ctx: &RunContext,
        instructions: &Instructions,
        models: &[String],
        progress: &dyn ProgressNotifier,
    ) -> Vec<ProcessingResult> {
        let mut join_set = JoinSet::new();
        let mut task_index = HashMap::new();
        let mut slots: Vec<Option<ProcessingResult>> = vec![None; models.len()];
        let mut claimed: HashMap<PathBuf, &str> = HashMap::new();

        for (index, model) in models.iter().enumerate() {
            let path = self.processor.output_path(model);
            if let Some(owner) = claimed.get(&path) {
                warn!(model = %model, owner = %owner, "Output path collides with an earlier model");
                let result = ProcessingResult::failure(
                    model.clone(),
                    ModelError::new(
                        FailureKind::OutputWriteFailed,
                        model.clone(),
                        format!("output path {} is already used by model {owner}", path.display()),
                    ),
                    std::time::Duration::ZERO,
                );
                progress.on_task_complete(&result);
                slots[index] = Some(result);
                continue;
            }
            claimed.insert(path, model.as_str());

            let registry = Arc::clone(&self.registry);
            let limiter = Arc::clone(&self.limiter);
            let processor = Arc::clone(&self.processor);
            let ctx = ctx.clone();
            let model = model.clone();
            let prompt = instructions.content().to_string();
            let span = info_span!("model", model = %model);

            let handle = join_set.spawn(
                async move {
                    let result =
                        Self::run_model(&registry, &limiter, &processor, &ctx, &model, &prompt)
                            .await;
                    (index, result)
                }
                .instrument(span),
            );
            task_index.insert(handle.id(), index);
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    match &result.error {
                        None => info!(model = %result.model, "Model completed"),
                        Some(e) => warn!(model = %result.model, kind = e.kind.as_str(), "Model failed: {}", e.detail),
                    }
                    progress.on_task_complete(&result);
                    slots[index] = Some(result);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                    if let Some(&index) = task_index.get(&e.id()) {
                        let model = &models[index];
                        let result = ProcessingResult::failure(
                            model.clone(),
                            ModelError::new(
                                FailureKind::ModelProcessingFailed,
                                model.clone(),
                                format!("task did not complete: {e}"),
                            ),
                            std::time::Duration::ZERO,
                        );
                        progress.on_task_complete(&result);
                        slots[index] = Some(result);
                    }
                }
            }
        }

        slots
            .into_iter()
            .zip(models)
            .map(|(slot, model)| {
                slot.unwrap_or_else(|| {
                    ProcessingResult::failure(
                        model.clone(),
                        ModelError::new(
                            FailureKind::ModelProcessingFailed,
                            model.clone(),
                            "task result lost",
                        ),
                        std::time::Duration::ZERO,
                    )
                })
            })
            .collect()
    }

    /// Admission plus the model pipeline for one model
    async fn run_model(
        registry: &ModelRegistry,
        limiter: &RateLimiter,
        processor: &ModelProcessor,
        ctx: &RunContext,
        model: &str,
        prompt: &str,
    ) -> ProcessingResult {
        let started = Instant::now();
        let mut state = TaskState::Pending;
        let fail = |state: &mut TaskState, error: ModelError| {
            advance_task(state, TaskState::Failed, model);
            ProcessingResult::failure(model, error, started.elapsed())
        };

        // Unknown models fail before taking an admission slot
        let provider = match registry.get_model(model) {
            Ok(def) => def.provider,
            Err(e) => {
                return fail(
                    &mut state,
                    ModelError::new(e.failure_kind(), model, e.to_string()),
                );
            }
        };

        let permit = match limiter.acquire(ctx, &provider).await {
            Ok(permit) => permit,
            Err(RateLimitError::Cancelled) => {
                return fail(&mut state, ModelError::cancelled(model));
            }
            Err(e) => {
                return fail(
                    &mut state,
                    ModelError::new(FailureKind::ModelProcessingFailed, model, e.to_string()),
                );
            }
        };
        advance_task(&mut state, TaskState::Running, model);
        debug!(provider = %provider, state = %state, "Admitted");

        let outcome = processor.process(ctx, model, prompt).await;
        permit.release();

        match outcome {
            Ok(content) => {
                advance_task(&mut state, TaskState::Completed, model);
                ProcessingResult::success(model, content, started.elapsed())
                    .with_output_path(processor.output_path(model))
            }
            Err(e) => fail(&mut state, e),
        }
    }

    /// First requested model whose output file is `path`
    fn path_owner<'a>(&self, models: &'a [String], path: &Path) -> Option<&'a str> {
        models
            .iter()
            .find(|m| self.processor.output_path(m) == path)
            .map(String::as_str)
    }

    async fn synthesize(
        &self,
        ctx: &RunContext,
        model: &str,
        instructions: &Instructions,
        per_model: &[ProcessingResult],
    ) -> SynthesisOutcome {
        let outputs: Vec<(String, String)> = per_model
            .iter()
            .filter_map(|r| r.content.as_ref().map(|c| (r.model.clone(), c.clone())))
            .collect();

        let content = match self
            .synthesis
            .synthesize(ctx, model, instructions.content(), &outputs)
            .await
        {
            Ok(content) => content,
            Err(error) => {
                warn!(model, "Synthesis failed: {}", error.detail);
                return SynthesisOutcome::Failed {
                    model: model.to_string(),
                    error,
                };
            }
        };

        let path = self.synthesis_path(model);
        match save_output(
            self.writer.as_ref(),
            self.audit.as_ref(),
            ctx,
            model,
            &content,
            &path,
        )
        .await
        {
            Ok(()) => {
                info!(model, path = %path.display(), "Synthesis saved");
                SynthesisOutcome::Succeeded {
                    model: model.to_string(),
                    content,
                    path,
                }
            }
            Err(error) => SynthesisOutcome::Failed {
                model: model.to_string(),
                error,
            },
        }
    }

    fn audit_cancelled(&self, ctx: &RunContext, inputs: Value) {
        audit(
            self.audit.as_ref(),
            ctx,
            RUN_OPERATION,
            AuditStatus::Failure,
            inputs,
            Value::Null,
            Some("run cancelled"),
        );
    }
}

fn advance_phase(tracker: &mut RunTracker, next: RunPhase) {
    if !tracker.advance(next) {
        warn!(from = %tracker.phase(), to = %next, "Rejected run phase transition");
        debug_assert!(false, "illegal run phase transition {} -> {next}", tracker.phase());
    }
}

fn advance_task(state: &mut TaskState, next: TaskState, model: &str) {
    if !state.advance(next) {
        warn!(model, from = %state, to = %next, "Rejected task state transition");
        debug_assert!(false, "illegal task state transition {state} -> {next}");
    }
}
