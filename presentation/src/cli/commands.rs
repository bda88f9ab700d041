//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Per-model status table
    Table,
    /// JSON output
    Json,
}

/// CLI arguments for council
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about = "Fan one task out to several LLMs and synthesize the results")]
#[command(long_about = r#"
Council sends the same instructions to several models concurrently, writes
each answer to its own file and optionally merges them with a synthesis
model.

Every model runs independently: one model failing never stops the others.
The exit code tells how the run went: 0 success, 2 partial failure,
1 total failure, 130 cancelled.

The model catalog is loaded from (first match wins):
1. --config <path>, ./council.toml or <config_dir>/council/models.toml
2. COUNCIL_MODEL_NAME, COUNCIL_PROVIDER, ... environment variables
3. The built-in catalog

Example:
  council -m gpt-4.1 -m openrouter/deepseek/deepseek-r1 "Review this design"
  council --instructions task.md -m gpt-4.1 -m o4-mini --synthesis-model gpt-4.1
  council --list-models
"#)]
pub struct Cli {
    /// The instructions to send to every model
    #[arg(value_name = "INSTRUCTIONS", conflicts_with = "instructions_file")]
    pub instructions: Option<String>,

    /// Read the instructions from a file instead
    #[arg(long = "instructions", value_name = "FILE")]
    pub instructions_file: Option<PathBuf>,

    /// Models to run (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Model that merges every successful output into one answer
    #[arg(long, value_name = "MODEL")]
    pub synthesis_model: Option<String>,

    /// Directory for output files [default: ./council-output/<timestamp>]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the provider base URL for every model
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Maximum number of models generating at once
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Append audit records (JSONL) to this file
    #[arg(long, value_name = "PATH")]
    pub audit_log: Option<PathBuf>,

    /// Also write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Output format [default: table, or [output] format from config]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// List the configured models and exit
    #[arg(long)]
    pub list_models: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Log filter directive chosen by `-v`/`-q`
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
