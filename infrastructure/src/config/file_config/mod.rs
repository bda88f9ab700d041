//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! The model catalog sections reuse the domain types directly.

mod output;
mod run;

pub use output::{FileOutputConfig, FileOutputFormat};
pub use run::FileRunConfig;

use council_domain::{ModelDefinition, ModelsConfig, ProviderDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Runtime settings
    pub run: FileRunConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Provider name -> environment variable holding its API key
    pub api_key_sources: BTreeMap<String, String>,
    pub providers: Vec<ProviderDefinition>,
    pub models: Vec<ModelDefinition>,
}

impl FileConfig {
    /// Whether the file declares a model catalog at all
    pub fn has_catalog(&self) -> bool {
        !self.providers.is_empty() || !self.models.is_empty()
    }

    /// The catalog sections as an (unvalidated) [`ModelsConfig`]
    pub fn models_config(&self) -> ModelsConfig {
        ModelsConfig {
            api_key_sources: self.api_key_sources.clone(),
            providers: self.providers.clone(),
            models: self.models.clone(),
        }
    }
}
