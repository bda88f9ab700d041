//! Built-in catalog used when neither a config file nor environment
//! configuration is available.

use super::entities::{ModelDefinition, ModelsConfig, ParameterDefinition, ProviderDefinition};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

impl ModelsConfig {
    /// The embedded provider/model set.
    pub fn embedded_default() -> Self {
        let temperature = || ParameterDefinition::float(0.7, 0.0, 2.0);
        let top_p = || ParameterDefinition::float(1.0, 0.0, 1.0);

        Self {
            api_key_sources: [
                ("openai".to_string(), "OPENAI_API_KEY".to_string()),
                ("openrouter".to_string(), "OPENROUTER_API_KEY".to_string()),
            ]
            .into(),
            providers: vec![
                ProviderDefinition::new("openai").with_base_url(OPENAI_BASE_URL),
                ProviderDefinition::new("openrouter").with_base_url(OPENROUTER_BASE_URL),
            ],
            models: vec![
                ModelDefinition::new("gpt-4.1", "openai", "gpt-4.1", 1_047_576, 32_768)
                    .with_parameter("temperature", temperature())
                    .with_parameter("top_p", top_p()),
                ModelDefinition::new("o4-mini", "openai", "o4-mini", 200_000, 100_000)
                    .with_parameter(
                        "reasoning_effort",
                        ParameterDefinition::choice("high", &["low", "medium", "high"]),
                    ),
                ModelDefinition::new(
                    "openrouter/deepseek/deepseek-r1",
                    "openrouter",
                    "deepseek/deepseek-r1",
                    131_072,
                    33_792,
                )
                .with_parameter("temperature", temperature())
                .with_parameter("top_p", top_p()),
                ModelDefinition::new(
                    "openrouter/meta-llama/llama-4-maverick",
                    "openrouter",
                    "meta-llama/llama-4-maverick",
                    1_048_576,
                    16_384,
                )
                .with_parameter("temperature", temperature())
                .with_parameter("top_p", top_p()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_is_valid() {
        let config = ModelsConfig::embedded_default();
        assert!(config.validate().is_ok());
        assert!(!config.models.is_empty());
    }

    #[test]
    fn test_embedded_default_has_key_source_per_provider() {
        let config = ModelsConfig::embedded_default();
        for provider in &config.providers {
            assert!(config.api_key_sources.contains_key(&provider.name));
        }
    }
}
