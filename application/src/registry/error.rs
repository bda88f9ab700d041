//! Registry error types

use crate::ports::config_loader::ConfigLoadError;
use council_domain::{ConfigValidationError, FailureKind, ProviderError};
use thiserror::Error;

/// Errors that can occur while loading the catalog or resolving clients
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Model '{0}' not found in registry")]
    ModelUnknown(String),

    #[error("Provider '{0}' not found in registry")]
    ProviderUnknown(String),

    #[error("No implementation registered for provider '{0}'")]
    ProviderUnregistered(String),

    #[error("Provider '{provider}' failed to create a client: {source}")]
    ClientCreation {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("API key for provider '{provider}' is not set (expected in ${env_var})")]
    MissingApiKey { provider: String, env_var: String },

    #[error(transparent)]
    ConfigurationInvalid(#[from] ConfigValidationError),

    #[error("Failed to load configuration from {source_name}: {source}")]
    Load {
        source_name: String,
        #[source]
        source: ConfigLoadError,
    },
}

impl RegistryError {
    /// Sentinel category this error reduces to
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RegistryError::ModelUnknown(_) => FailureKind::ModelUnknown,
            RegistryError::ProviderUnregistered(_) => FailureKind::ProviderUnregistered,
            RegistryError::ConfigurationInvalid(_) | RegistryError::Load { .. } => {
                FailureKind::ConfigurationInvalid
            }
            RegistryError::ProviderUnknown(_)
            | RegistryError::ClientCreation { .. }
            | RegistryError::MissingApiKey { .. } => FailureKind::ModelInitializationFailed,
        }
    }

    /// Provider-side error behind this failure, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            RegistryError::ClientCreation { source, .. } => Some(source),
            _ => None,
        }
    }
}
