//! Progress reporting for a run

use colored::Colorize;
use council_application::ProgressNotifier;
use council_domain::{ProcessingResult, RunPhase};

/// Simple line-based progress written to stderr, so stdout stays clean
/// for `--format json`.
pub struct SimpleProgress;

impl SimpleProgress {
    fn phase_line(phase: RunPhase, total_tasks: usize) -> String {
        let noun = if total_tasks == 1 { "model" } else { "models" };
        let title = match phase {
            RunPhase::Dispatching => "Dispatching",
            RunPhase::Synthesizing => "Synthesizing",
            other => other.as_str(),
        };
        format!("{} {} ({} {})", "->".cyan(), title.bold(), total_tasks, noun)
    }

    fn task_line(result: &ProcessingResult) -> String {
        let secs = result.duration_ms as f64 / 1000.0;
        match &result.error {
            None => format!("  {} {} ({:.1}s)", "v".green(), result.model, secs),
            Some(err) => format!(
                "  {} {} ({}, {:.1}s)",
                "x".red(),
                result.model,
                err.kind.label(),
                secs
            ),
        }
    }
}

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: RunPhase, total_tasks: usize) {
        eprintln!("{}", Self::phase_line(phase, total_tasks));
    }

    fn on_task_complete(&self, result: &ProcessingResult) {
        eprintln!("{}", Self::task_line(result));
    }

    fn on_synthesis_complete(&self, model: &str, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{FailureKind, ModelError};
    use std::time::Duration;

    #[test]
    fn test_phase_line_pluralizes() {
        assert!(SimpleProgress::phase_line(RunPhase::Dispatching, 3).contains("3 models"));
        assert!(SimpleProgress::phase_line(RunPhase::Synthesizing, 1).contains("1 model)"));
    }

    #[test]
    fn test_phase_line_other_phases_use_phase_name() {
        let line = SimpleProgress::phase_line(RunPhase::Aggregating, 2);
        assert!(line.contains("aggregating"));
    }

    #[test]
    fn test_task_line_shows_failure_label() {
        let failed = ProcessingResult::failure(
            "m2",
            ModelError::new(FailureKind::ModelRateLimited, "m2", "429"),
            Duration::from_millis(2500),
        );
        let line = SimpleProgress::task_line(&failed);
        assert!(line.contains("m2"));
        assert!(line.contains("RATE-LIMITED"));
        assert!(line.contains("2.5s"));
    }
}
