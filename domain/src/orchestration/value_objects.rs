//! Orchestration value objects - immutable result types for a fan-out run.
//!
//! - [`ProcessingResult`] - one model's outcome
//! - [`SynthesisOutcome`] - what happened to the optional synthesis step
//! - [`RunSummary`] - counts for the final audit record
//! - [`RunResult`] - everything the CLI needs to report and pick an exit code

use crate::core::error::{FailureKind, ModelError};
use crate::orchestration::entities::TaskState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a single model's pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ModelError>,
    /// Where the output was written, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub duration_ms: u64,
    /// Final lifecycle state of the model's task
    pub state: TaskState,
}

impl ProcessingResult {
    pub fn success(model: impl Into<String>, content: impl Into<String>, duration: Duration) -> Self {
        Self {
            model: model.into(),
            content: Some(content.into()),
            error: None,
            output_path: None,
            duration_ms: duration.as_millis() as u64,
            state: TaskState::Completed,
        }
    }

    pub fn failure(model: impl Into<String>, error: ModelError, duration: Duration) -> Self {
        Self {
            model: model.into(),
            content: None,
            error: Some(error),
            output_path: None,
            duration_ms: duration.as_millis() as u64,
            state: TaskState::Failed,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.content.is_some()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every model succeeded (and synthesis, if requested)
    Success,
    /// At least one model succeeded, but something failed
    PartialFailure,
    /// No model produced output
    TotalFailure,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::PartialFailure => "partial_failure",
            RunStatus::TotalFailure => "total_failure",
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::TotalFailure => 1,
            RunStatus::PartialFailure => 2,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the optional synthesis step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SynthesisOutcome {
    /// No synthesis model was configured
    NotRequested,
    /// Synthesis was configured but not attempted (no successful outputs)
    Skipped { model: String },
    Succeeded {
        model: String,
        content: String,
        path: PathBuf,
    },
    Failed { model: String, error: ModelError },
}

impl SynthesisOutcome {
    pub fn was_attempted(&self) -> bool {
        matches!(
            self,
            SynthesisOutcome::Succeeded { .. } | SynthesisOutcome::Failed { .. }
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SynthesisOutcome::Succeeded { .. })
    }
}

/// Aggregate counts for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub synthesis_attempted: bool,
    pub synthesis_succeeded: bool,
    pub duration_ms: u64,
}

/// Complete result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub correlation_id: String,
    pub status: RunStatus,
    /// One entry per requested model, in request order
    pub per_model: Vec<ProcessingResult>,
    pub synthesis: SynthesisOutcome,
    pub summary: RunSummary,
}

impl RunResult {
    /// Derive the status from per-model results and the synthesis outcome.
    pub fn classify(per_model: &[ProcessingResult], synthesis: &SynthesisOutcome) -> RunStatus {
        let succeeded = per_model.iter().filter(|r| r.is_success()).count();
        if succeeded == 0 {
            RunStatus::TotalFailure
        } else if succeeded < per_model.len() || matches!(synthesis, SynthesisOutcome::Failed { .. })
        {
            RunStatus::PartialFailure
        } else {
            RunStatus::Success
        }
    }

    pub fn get(&self, model: &str) -> Option<&ProcessingResult> {
        self.per_model.iter().find(|r| r.model == model)
    }

    pub fn successes(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.per_model.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.per_model.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(model: &str) -> ProcessingResult {
        ProcessingResult::success(model, "content", Duration::from_millis(5))
    }

    fn failed(model: &str) -> ProcessingResult {
        ProcessingResult::failure(
            model,
            ModelError::new(FailureKind::ModelProcessingFailed, model, "boom"),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_classify_success() {
        let status = RunResult::classify(&[ok("a"), ok("b")], &SynthesisOutcome::NotRequested);
        assert_eq!(status, RunStatus::Success);
        assert_eq!(status.exit_code(), 0);
    }

    #[test]
    fn test_classify_partial() {
        let status = RunResult::classify(&[ok("a"), failed("b")], &SynthesisOutcome::NotRequested);
        assert_eq!(status, RunStatus::PartialFailure);
    }

    #[test]
    fn test_classify_total() {
        let status = RunResult::classify(&[failed("a"), failed("b")], &SynthesisOutcome::NotRequested);
        assert_eq!(status, RunStatus::TotalFailure);
        assert_eq!(status.exit_code(), 1);
    }

    #[test]
    fn test_failed_synthesis_downgrades_to_partial() {
        let synthesis = SynthesisOutcome::Failed {
            model: "s1".to_string(),
            error: ModelError::new(FailureKind::ModelRateLimited, "s1", "429"),
        };
        assert_eq!(
            RunResult::classify(&[ok("a")], &synthesis),
            RunStatus::PartialFailure
        );
        assert!(synthesis.was_attempted());
        assert!(!synthesis.is_success());
    }

    #[test]
    fn test_processing_result_accessors() {
        let result = failed("m");
        assert!(!result.is_success());
        assert_eq!(result.failure_kind(), Some(FailureKind::ModelProcessingFailed));
        assert_eq!(result.duration(), Duration::from_millis(5));
    }
}
