//! Port for reading the model catalog from an external source.
//!
//! The loader only reads; precedence between sources and validation belong
//! to the [`ModelRegistry`](crate::registry::ModelRegistry).

use council_domain::ModelsConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Incomplete configuration, missing {0}")]
    Incomplete(String),
}

pub trait ModelsConfigLoader: Send + Sync {
    /// Short name of the source for logs ("file", "environment", ...)
    fn source_name(&self) -> &str;

    fn load(&self) -> Result<ModelsConfig, ConfigLoadError>;
}

/// Loader that always returns a fixed config. Useful in tests and for
/// callers that already hold a parsed catalog.
pub struct StaticConfigLoader {
    config: ModelsConfig,
}

impl StaticConfigLoader {
    pub fn new(config: ModelsConfig) -> Self {
        Self { config }
    }
}

impl ModelsConfigLoader for StaticConfigLoader {
    fn source_name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<ModelsConfig, ConfigLoadError> {
        Ok(self.config.clone())
    }
}

/// Loader representing an absent source
pub struct MissingConfigLoader;

impl ModelsConfigLoader for MissingConfigLoader {
    fn source_name(&self) -> &str {
        "none"
    }

    fn load(&self) -> Result<ModelsConfig, ConfigLoadError> {
        Err(ConfigLoadError::NotFound("no configuration source".to_string()))
    }
}
