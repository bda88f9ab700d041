//! Progress notification port
//!
//! Defines the interface for reporting progress during a fan-out run.

use council_domain::{ProcessingResult, RunPhase};

/// Callback for progress updates during a run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, JSON events, etc.). Callbacks are
/// invoked from the aggregation point only, never from model tasks.
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: RunPhase, total_tasks: usize);

    /// Called when one model's pipeline has finished
    fn on_task_complete(&self, result: &ProcessingResult);

    /// Called when the synthesis step has finished
    fn on_synthesis_complete(&self, _model: &str, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: RunPhase, _total_tasks: usize) {}
    fn on_task_complete(&self, _result: &ProcessingResult) {}
}
