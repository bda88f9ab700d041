//! Output formatter trait

use council_domain::{ModelInfo, RunResult};

/// Trait for formatting run results
pub trait OutputFormatter {
    /// Format the per-model status table and synthesis outcome
    fn format(&self, result: &RunResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &RunResult) -> String;

    /// Format the model catalog listing
    fn format_models(&self, models: &[ModelInfo]) -> String;
}
