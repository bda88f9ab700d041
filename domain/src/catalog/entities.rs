//! Model and provider definitions as they appear in configuration.

use crate::provider::response::ModelParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A provider (API family) hosting one or more models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Value type of a model parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Float,
    Int,
    String,
    Bool,
}

/// Schema entry for one tunable model parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl ParameterDefinition {
    pub fn float(default: f64, min: f64, max: f64) -> Self {
        Self {
            kind: ParameterKind::Float,
            default: Some(serde_json::json!(default)),
            min: Some(min),
            max: Some(max),
            enum_values: Vec::new(),
        }
    }

    pub fn int(default: i64, min: f64, max: f64) -> Self {
        Self {
            kind: ParameterKind::Int,
            default: Some(serde_json::json!(default)),
            min: Some(min),
            max: Some(max),
            enum_values: Vec::new(),
        }
    }

    pub fn choice(default: &str, values: &[&str]) -> Self {
        Self {
            kind: ParameterKind::String,
            default: Some(serde_json::json!(default)),
            min: None,
            max: None,
            enum_values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// A model alias and everything needed to call it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    pub provider: String,
    pub api_model_id: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterDefinition>,
}

impl ModelDefinition {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        api_model_id: impl Into<String>,
        context_window: u32,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            api_model_id: api_model_id.into(),
            context_window,
            max_output_tokens,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, def: ParameterDefinition) -> Self {
        self.parameters.insert(name.into(), def);
        self
    }

    /// Parameters that declare a default value
    pub fn default_parameters(&self) -> ModelParameters {
        self.parameters
            .iter()
            .filter_map(|(name, def)| def.default.clone().map(|v| (name.clone(), v)))
            .collect()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            provider: self.provider.clone(),
            api_model_id: self.api_model_id.clone(),
            context_window: self.context_window,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Read-only summary of a model for pre-run validation and listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub provider: String,
    pub api_model_id: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
}

/// Complete provider/model catalog
///
/// # Example
///
/// ```toml
/// [api_key_sources]
/// openai = "OPENAI_API_KEY"
///
/// [[providers]]
/// name = "openai"
/// base_url = "https://api.openai.com/v1"
///
/// [[models]]
/// name = "gpt-4.1"
/// provider = "openai"
/// api_model_id = "gpt-4.1"
/// context_window = 1047576
/// max_output_tokens = 32768
///
/// [models.parameters.temperature]
/// type = "float"
/// default = 0.7
/// min = 0.0
/// max = 2.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// provider name -> environment variable holding its API key
    #[serde(default)]
    pub api_key_sources: BTreeMap<String, String>,
    #[serde(default)]
    pub providers: Vec<ProviderDefinition>,
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_only_includes_defaults() {
        let mut model = ModelDefinition::new("m", "p", "m-1", 1000, 100)
            .with_parameter("temperature", ParameterDefinition::float(0.7, 0.0, 2.0));
        model.parameters.insert(
            "seed".to_string(),
            ParameterDefinition {
                kind: ParameterKind::Int,
                default: None,
                min: None,
                max: None,
                enum_values: Vec::new(),
            },
        );

        let params = model.default_parameters();
        assert_eq!(params.len(), 1);
        assert_eq!(params["temperature"], serde_json::json!(0.7));
    }

    #[test]
    fn test_models_config_from_toml() {
        let toml_str = r#"
[api_key_sources]
openai = "OPENAI_API_KEY"

[[providers]]
name = "openai"
base_url = "https://api.openai.com/v1"

[[models]]
name = "gpt-4.1"
provider = "openai"
api_model_id = "gpt-4.1"
context_window = 1047576
max_output_tokens = 32768

[models.parameters.temperature]
type = "float"
default = 0.7
min = 0.0
max = 2.0

[models.parameters.reasoning_effort]
type = "string"
default = "medium"
enum_values = ["low", "medium", "high"]
"#;
        let config: ModelsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.api_key_sources["openai"], "OPENAI_API_KEY");

        let model = &config.models[0];
        assert_eq!(model.context_window, 1_047_576);
        assert_eq!(model.parameters["temperature"].kind, ParameterKind::Float);
        assert_eq!(model.parameters["reasoning_effort"].enum_values.len(), 3);
        assert_eq!(
            model.default_parameters()["reasoning_effort"],
            serde_json::json!("medium")
        );
    }
}
