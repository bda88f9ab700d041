//! Application layer for council
//!
//! This crate contains the model registry, admission control, the per-model
//! and synthesis pipelines, the run orchestrator and the port definitions
//! they depend on. It depends only on the domain layer.

pub mod config;
pub mod context;
pub mod ports;
pub mod rate_limit;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::RunParams;
pub use context::RunContext;
pub use ports::{
    api_service::{ApiKeyResolver, ApiService},
    audit_logger::{AuditEntry, AuditError, AuditLogger, AuditStatus, NoAuditLogger},
    config_loader::{ConfigLoadError, MissingConfigLoader, ModelsConfigLoader, StaticConfigLoader},
    file_writer::{FileWriteError, FileWriter},
    llm_client::{LlmClient, ProviderImplementation},
    progress::{NoProgress, ProgressNotifier},
};
pub use rate_limit::{RateLimitConfig, RateLimitError, RateLimiter, RatePermit};
pub use registry::{ConfigSource, ModelRegistry, RegistryApiService, RegistryError};
pub use use_cases::process_model::ModelProcessor;
pub use use_cases::run_orchestration::{Orchestrator, OrchestratorError};
pub use use_cases::synthesize::SynthesisService;
