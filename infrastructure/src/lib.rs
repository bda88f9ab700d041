//! Infrastructure layer for council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration file and environment loading,
//! the JSONL audit trail, local output files and the OpenAI-compatible
//! provider.

pub mod config;
pub mod fs;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, EnvModelsConfigLoader, FileConfig, FileModelsConfigLoader, FileOutputConfig,
    FileOutputFormat, FileRunConfig,
};
pub use fs::LocalFileWriter;
pub use logging::JsonlAuditLogger;
pub use providers::{
    EnvApiKeyResolver, OpenAiCompatibleClient, OpenAiCompatibleProvider, register_all_providers,
    register_default_providers,
};
