//! Structural validation of a [`ModelsConfig`].
//!
//! Validation stops at the first violation and names the offending field
//! path (e.g. `models[2].api_model_id`) so a user can fix the file directly.

use super::entities::ModelsConfig;
use std::collections::HashSet;
use thiserror::Error;

/// A configuration violation tied to one field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration at `{field}`: {message}")]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ModelsConfig {
    /// Check counts, uniqueness, required fields and provider references.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.providers.is_empty() {
            return Err(ConfigValidationError::new(
                "providers",
                "at least one provider must be defined",
            ));
        }
        if self.models.is_empty() {
            return Err(ConfigValidationError::new(
                "models",
                "at least one model must be defined",
            ));
        }

        let mut provider_names = HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    format!("providers[{}].name", i),
                    "provider name cannot be empty",
                ));
            }
            if !provider_names.insert(provider.name.as_str()) {
                return Err(ConfigValidationError::new(
                    format!("providers[{}].name", i),
                    format!("duplicate provider name '{}'", provider.name),
                ));
            }
        }

        let mut model_names = HashSet::new();
        for (i, model) in self.models.iter().enumerate() {
            if model.name.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    format!("models[{}].name", i),
                    "model name cannot be empty",
                ));
            }
            if !model_names.insert(model.name.as_str()) {
                return Err(ConfigValidationError::new(
                    format!("models[{}].name", i),
                    format!("duplicate model name '{}'", model.name),
                ));
            }
            if model.provider.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    format!("models[{}].provider", i),
                    format!("model '{}' has no provider", model.name),
                ));
            }
            if !provider_names.contains(model.provider.as_str()) {
                return Err(ConfigValidationError::new(
                    format!("models[{}].provider", i),
                    format!(
                        "model '{}' references undefined provider '{}'",
                        model.name, model.provider
                    ),
                ));
            }
            if model.api_model_id.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    format!("models[{}].api_model_id", i),
                    format!("model '{}' has an empty api_model_id", model.name),
                ));
            }
            for (param, def) in &model.parameters {
                if let (Some(min), Some(max)) = (def.min, def.max)
                    && min > max
                {
                    return Err(ConfigValidationError::new(
                        format!("models[{}].parameters.{}", i, param),
                        format!("min ({}) is greater than max ({})", min, max),
                    ));
                }
            }
        }

        for (provider, env_var) in &self.api_key_sources {
            if env_var.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    format!("api_key_sources.{}", provider),
                    "environment variable name cannot be empty",
                ));
            }
        }

        Ok(())
    }
}
