//! CLI entrypoint for council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    AuditLogger, ModelRegistry, NoAuditLogger, Orchestrator, OrchestratorError, RateLimiter,
    RegistryApiService, RunContext, RunParams,
};
use council_domain::{Instructions, ModelInfo, RunResult};
use council_infrastructure::{
    ConfigLoader, EnvApiKeyResolver, EnvModelsConfigLoader, FileConfig, FileModelsConfigLoader,
    FileOutputFormat, JsonlAuditLogger, LocalFileWriter, register_default_providers,
};
use council_presentation::{Cli, ConsoleFormatter, OutputFormat, SimpleProgress};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Exit code for a run interrupted by Ctrl-C
const EXIT_CANCELLED: u8 = 130;

const DEFAULT_OUTPUT_ROOT: &str = "council-output";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Install the console subscriber, plus a file layer when `--log-file` is set
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(cli.log_level()));

    let Some(path) = &cli.log_file else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} has no file name", path.display()))?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    // The file always gets at least info, whatever the console shows
    let file_level = match cli.verbose {
        0 | 1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(EnvFilter::new(file_level));

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(Some(guard))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    // === Configuration ===
    let loader = ConfigLoader::new(cli.config.clone());
    let config = loader.load().context("Failed to load configuration")?;
    if !config.output.color {
        colored::control::set_override(false);
    }
    let format = cli.format.unwrap_or(match config.output.format {
        Some(FileOutputFormat::Json) => OutputFormat::Json,
        Some(FileOutputFormat::Table) | None => OutputFormat::Table,
    });

    let registry = Arc::new(ModelRegistry::new());
    let source = registry
        .initialize(
            &FileModelsConfigLoader::new(loader.clone()),
            &EnvModelsConfigLoader::from_env(),
        )
        .context("Failed to initialize the model registry")?;
    info!(?source, models = registry.get_all_models().len(), "Model registry ready");
    register_default_providers(&registry).context("Failed to register providers")?;

    if cli.list_models {
        print_models(&registry, format)?;
        return Ok(ExitCode::SUCCESS);
    }

    // === Validation ===
    let instructions = read_instructions(&cli)?;
    let params = run_params(&cli, &config);
    let models = params.unique_models();
    if models.is_empty() {
        bail!("At least one model is required (-m <MODEL>). Use --list-models to see options.");
    }
    let unknown: Vec<_> = models
        .iter()
        .map(String::as_str)
        .chain(params.synthesis_model())
        .filter(|m| !registry.is_model_supported(m))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        bail!(
            "Unknown model(s): {}. Use --list-models to see configured models.",
            unknown.join(", ")
        );
    }

    // === Dependency Injection ===
    let audit = audit_logger(cli.audit_log.as_ref().or(config.run.audit_log.as_ref()));
    let api = Arc::new(RegistryApiService::new(
        Arc::clone(&registry),
        Arc::new(EnvApiKeyResolver::from_env()),
    ));
    let limiter = Arc::new(RateLimiter::new(
        config.run.rate_limit_config(cli.max_concurrent),
    ));
    let output_dir = params.output_dir().to_path_buf();
    let orchestrator = Orchestrator::new(
        Arc::clone(&registry),
        api,
        Arc::new(LocalFileWriter::new()),
        audit,
        limiter,
        params,
    );

    // === Run ===
    let token = CancellationToken::new();
    let ctrl_c = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                token.cancel();
            }
        })
    };

    let ctx = RunContext::new(token);
    if !cli.quiet {
        eprintln!(
            "Running {} model(s), writing to {}",
            models.len(),
            output_dir.display()
        );
    }

    let outcome = if cli.quiet {
        orchestrator.run(&ctx, &instructions).await
    } else {
        orchestrator
            .run_with_progress(&ctx, &instructions, &SimpleProgress)
            .await
    };
    ctrl_c.abort();

    match outcome {
        Ok(result) => {
            print_result(&result, format);
            Ok(exit_code(result.status.exit_code()))
        }
        Err(OrchestratorError::Cancelled) => {
            eprintln!("Run cancelled");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(e) => Err(e.into()),
    }
}

fn read_instructions(cli: &Cli) -> Result<Instructions> {
    let content = match (&cli.instructions, &cli.instructions_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read instructions from {}", path.display()))?,
        (None, None) => bail!("Instructions are required (positional text or --instructions <FILE>)"),
    };
    Instructions::try_new(content).context("Instructions are empty")
}

fn run_params(cli: &Cli, config: &FileConfig) -> RunParams {
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| {
        let root = config
            .run
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT));
        root.join(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string())
    });

    let mut params = RunParams::new(cli.model.iter().cloned()).with_output_dir(output_dir);
    if let Some(model) = cli
        .synthesis_model
        .clone()
        .or_else(|| config.run.synthesis_model.clone())
    {
        params = params.with_synthesis_model(model);
    }
    if let Some(endpoint) = &cli.endpoint {
        params = params.with_endpoint(endpoint.clone());
    }
    params
}

fn audit_logger(path: Option<&PathBuf>) -> Arc<dyn AuditLogger> {
    match path.and_then(JsonlAuditLogger::new) {
        Some(logger) => {
            info!(path = %logger.path().display(), "Audit log enabled");
            Arc::new(logger)
        }
        None => Arc::new(NoAuditLogger),
    }
}

fn print_models(registry: &ModelRegistry, format: OutputFormat) -> Result<()> {
    let models = registry
        .get_all_models()
        .iter()
        .map(|name| registry.get_model_info(name))
        .collect::<Result<Vec<ModelInfo>, _>>()?;

    match format {
        OutputFormat::Table => print!("{}", ConsoleFormatter::format_models(&models)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_models_json(&models)),
    }
    Ok(())
}

fn print_result(result: &RunResult, format: OutputFormat) {
    match format {
        OutputFormat::Table => print!("{}", ConsoleFormatter::format(result)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(result)),
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
