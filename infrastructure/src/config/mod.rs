//! Configuration loading for council
//!
//! This module handles file I/O and merging of configuration from multiple
//! sources. File priority (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./council.toml` or `./.council.toml`
//! 3. User config: `<config_dir>/council/models.toml`
//! 4. Default values
//!
//! The model catalog additionally falls back to `COUNCIL_*` environment
//! variables and then to the embedded defaults inside the registry.

mod file_config;
mod loader;
mod models_loader;

pub use file_config::{FileConfig, FileOutputConfig, FileOutputFormat, FileRunConfig};
pub use loader::ConfigLoader;
pub use models_loader::{EnvModelsConfigLoader, FileModelsConfigLoader};
