//! Console output formatter for run results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_domain::{
    ModelInfo, ProcessingResult, RunResult, RunStatus, SynthesisOutcome, truncate,
};

const MODEL_WIDTH: usize = 36;
const STATUS_WIDTH: usize = 13;
const DETAIL_WIDTH: usize = 100;

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete run result
    pub fn format(result: &RunResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Council Results"));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n\n",
            "Run:".cyan().bold(),
            result.correlation_id
        ));

        output.push_str(&format!(
            "{:<mw$} {:<sw$} {:>8}  {}\n",
            "MODEL",
            "STATUS",
            "TIME",
            "OUTPUT",
            mw = MODEL_WIDTH,
            sw = STATUS_WIDTH
        ));
        for row in &result.per_model {
            output.push_str(&Self::row(row));
            output.push('\n');
        }

        output.push_str(&Self::section_header("Synthesis"));
        output.push_str(&Self::synthesis_line(&result.synthesis));
        output.push('\n');

        let summary = &result.summary;
        output.push_str(&format!(
            "\n{} {} ({} of {} models succeeded in {:.1}s)\n",
            "Status:".cyan().bold(),
            Self::status(result.status),
            summary.succeeded,
            summary.attempted,
            summary.duration_ms as f64 / 1000.0
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(result: &RunResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the catalog as a table
    pub fn format_models(models: &[ModelInfo]) -> String {
        if models.is_empty() {
            return format!("{}\n", "No models configured".yellow());
        }

        let mut output = format!(
            "{:<mw$} {:<12} {:<32} {:>10} {:>10}\n",
            "MODEL".bold(),
            "PROVIDER".bold(),
            "API MODEL ID".bold(),
            "CONTEXT".bold(),
            "MAX OUT".bold(),
            mw = MODEL_WIDTH
        );
        for info in models {
            output.push_str(&format!(
                "{:<mw$} {:<12} {:<32} {:>10} {:>10}\n",
                info.name,
                info.provider,
                info.api_model_id,
                info.context_window,
                info.max_output_tokens,
                mw = MODEL_WIDTH
            ));
        }
        output
    }

    /// Format the catalog as JSON
    pub fn format_models_json(models: &[ModelInfo]) -> String {
        serde_json::to_string_pretty(models).unwrap_or_else(|_| "[]".to_string())
    }

    fn row(result: &ProcessingResult) -> String {
        let time = format!("{:.1}s", result.duration_ms as f64 / 1000.0);
        let (status, detail) = match &result.error {
            None => (
                format!("{:<sw$}", "OK", sw = STATUS_WIDTH).green().bold(),
                result
                    .output_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
                    .normal(),
            ),
            Some(err) => (
                format!("{:<sw$}", err.kind.label(), sw = STATUS_WIDTH)
                    .red()
                    .bold(),
                truncate(&err.detail, DETAIL_WIDTH).dimmed(),
            ),
        };

        format!(
            "{:<mw$} {} {:>8}  {}",
            result.model,
            status,
            time,
            detail,
            mw = MODEL_WIDTH
        )
    }

    fn synthesis_line(outcome: &SynthesisOutcome) -> String {
        match outcome {
            SynthesisOutcome::NotRequested => format!("{}", "not requested".dimmed()),
            SynthesisOutcome::Skipped { model } => format!(
                "{} {} (no successful outputs)",
                "SKIPPED".yellow().bold(),
                model
            ),
            SynthesisOutcome::Succeeded { model, path, .. } => format!(
                "{} {} -> {}",
                "OK".green().bold(),
                model,
                path.display()
            ),
            SynthesisOutcome::Failed { model, error } => format!(
                "{} {}: {}",
                error.kind.label().red().bold(),
                model,
                truncate(&error.detail, DETAIL_WIDTH)
            ),
        }
    }

    fn status(status: RunStatus) -> String {
        match status {
            RunStatus::Success => status.as_str().green().bold().to_string(),
            RunStatus::PartialFailure => status.as_str().yellow().bold().to_string(),
            RunStatus::TotalFailure => status.as_str().red().bold().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &RunResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &RunResult) -> String {
        Self::format_json(result)
    }

    fn format_models(&self, models: &[ModelInfo]) -> String {
        Self::format_models(models)
    }
}
