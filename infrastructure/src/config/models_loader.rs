//! Model catalog loaders for the registry's file and environment tiers

use super::loader::ConfigLoader;
use council_application::{ConfigLoadError, ModelsConfigLoader};
use council_domain::{ModelDefinition, ModelsConfig, ProviderDefinition};
use std::collections::BTreeMap;
use tracing::debug;

/// Reads `[[providers]]`, `[[models]]` and `[api_key_sources]` from the
/// merged TOML configuration files.
pub struct FileModelsConfigLoader {
    loader: ConfigLoader,
}

impl FileModelsConfigLoader {
    pub fn new(loader: ConfigLoader) -> Self {
        Self { loader }
    }
}

impl ModelsConfigLoader for FileModelsConfigLoader {
    fn source_name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<ModelsConfig, ConfigLoadError> {
        let sources = self.loader.sources();
        if sources.is_empty() {
            return Err(ConfigLoadError::NotFound(
                "no council.toml or models.toml found".to_string(),
            ));
        }

        let config = self.loader.load()?;
        if !config.has_catalog() {
            return Err(ConfigLoadError::NotFound(format!(
                "no [[models]] defined in {}",
                sources
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        debug!(files = sources.len(), "Loaded model catalog from file");
        Ok(config.models_config())
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a single-model catalog from `COUNCIL_*` environment variables.
///
/// Required: `COUNCIL_MODEL_NAME`, `COUNCIL_PROVIDER`,
/// `COUNCIL_API_MODEL_ID`, `COUNCIL_CONTEXT_WINDOW`,
/// `COUNCIL_MAX_OUTPUT_TOKENS`. Optional: `COUNCIL_BASE_URL`,
/// `COUNCIL_API_KEY_ENV`.
pub struct EnvModelsConfigLoader {
    lookup: Lookup,
}

impl EnvModelsConfigLoader {
    pub const MODEL_NAME: &'static str = "COUNCIL_MODEL_NAME";
    pub const PROVIDER: &'static str = "COUNCIL_PROVIDER";
    pub const API_MODEL_ID: &'static str = "COUNCIL_API_MODEL_ID";
    pub const CONTEXT_WINDOW: &'static str = "COUNCIL_CONTEXT_WINDOW";
    pub const MAX_OUTPUT_TOKENS: &'static str = "COUNCIL_MAX_OUTPUT_TOKENS";
    pub const BASE_URL: &'static str = "COUNCIL_BASE_URL";
    pub const API_KEY_ENV: &'static str = "COUNCIL_API_KEY_ENV";

    /// Loader reading the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigLoadError> {
        self.optional(key)
            .ok_or_else(|| ConfigLoadError::Incomplete(key.to_string()))
    }

    fn required_u32(&self, key: &str) -> Result<u32, ConfigLoadError> {
        let raw = self.required(key)?;
        raw.parse()
            .map_err(|_| ConfigLoadError::Parse(format!("{key}={raw} is not a valid number")))
    }
}

impl ModelsConfigLoader for EnvModelsConfigLoader {
    fn source_name(&self) -> &str {
        "environment"
    }

    fn load(&self) -> Result<ModelsConfig, ConfigLoadError> {
        let name = self.required(Self::MODEL_NAME)?;
        let provider = self.required(Self::PROVIDER)?;
        let api_model_id = self.required(Self::API_MODEL_ID)?;
        let context_window = self.required_u32(Self::CONTEXT_WINDOW)?;
        let max_output_tokens = self.required_u32(Self::MAX_OUTPUT_TOKENS)?;

        let mut provider_def = ProviderDefinition::new(&provider);
        if let Some(url) = self.optional(Self::BASE_URL) {
            provider_def = provider_def.with_base_url(url);
        }

        let mut api_key_sources = BTreeMap::new();
        if let Some(var) = self.optional(Self::API_KEY_ENV) {
            api_key_sources.insert(provider.clone(), var);
        }

        Ok(ModelsConfig {
            api_key_sources,
            providers: vec![provider_def],
            models: vec![ModelDefinition::new(
                name,
                provider,
                api_model_id,
                context_window,
                max_output_tokens,
            )],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    fn env_loader(vars: &[(&str, &str)]) -> EnvModelsConfigLoader {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvModelsConfigLoader::with_lookup(move |key| vars.get(key).cloned())
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("COUNCIL_MODEL_NAME", "local-llama"),
            ("COUNCIL_PROVIDER", "ollama"),
            ("COUNCIL_API_MODEL_ID", "llama3.1:8b"),
            ("COUNCIL_CONTEXT_WINDOW", "131072"),
            ("COUNCIL_MAX_OUTPUT_TOKENS", "4096"),
        ]
    }

    fn file_loader(dir: &Path) -> FileModelsConfigLoader {
        FileModelsConfigLoader::new(
            ConfigLoader::new(None)
                .with_project_dir(dir)
                .with_global_path(None)
                .without_env(),
        )
    }

    #[test]
    fn test_env_loader_builds_single_model() {
        let mut vars = complete_env();
        vars.push(("COUNCIL_BASE_URL", "http://localhost:11434/v1"));
        vars.push(("COUNCIL_API_KEY_ENV", "OLLAMA_KEY"));

        let config = env_loader(&vars).load().unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.models[0].name, "local-llama");
        assert_eq!(config.models[0].api_model_id, "llama3.1:8b");
        assert_eq!(config.models[0].context_window, 131072);
        assert_eq!(
            config.providers[0].base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
        assert_eq!(config.api_key_sources["ollama"], "OLLAMA_KEY");
    }

    #[test]
    fn test_env_loader_reports_missing_variable() {
        let vars: Vec<_> = complete_env()
            .into_iter()
            .filter(|(k, _)| *k != "COUNCIL_API_MODEL_ID")
            .collect();

        match env_loader(&vars).load() {
            Err(ConfigLoadError::Incomplete(var)) => assert_eq!(var, "COUNCIL_API_MODEL_ID"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_env_loader_treats_blank_as_missing() {
        let mut vars = complete_env();
        vars[0] = ("COUNCIL_MODEL_NAME", "   ");
        assert!(matches!(
            env_loader(&vars).load(),
            Err(ConfigLoadError::Incomplete(_))
        ));
    }

    #[test]
    fn test_env_loader_rejects_bad_number() {
        let mut vars = complete_env();
        vars[3] = ("COUNCIL_CONTEXT_WINDOW", "lots");
        assert!(matches!(
            env_loader(&vars).load(),
            Err(ConfigLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_file_loader_not_found_without_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            file_loader(dir.path()).load(),
            Err(ConfigLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_loader_not_found_without_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("council.toml"), "[run]\nmax_concurrent = 2\n").unwrap();

        assert!(matches!(
            file_loader(dir.path()).load(),
            Err(ConfigLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_loader_reads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("council.toml"),
            r#"
[api_key_sources]
groq = "GROQ_API_KEY"

[[providers]]
name = "groq"
base_url = "https://api.groq.com/openai/v1"

[[models]]
name = "llama-70b"
provider = "groq"
api_model_id = "llama-3.3-70b-versatile"
context_window = 131072
max_output_tokens = 32768
"#,
        )
        .unwrap();

        let config = file_loader(dir.path()).load().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.models[0].name, "llama-70b");
        assert_eq!(config.api_key_sources["groq"], "GROQ_API_KEY");
    }

    #[test]
    fn test_file_loader_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("council.toml"),
            "[[models]]\nname = \"m\"\nprovider = \"p\"\n",
        )
        .unwrap();

        assert!(matches!(
            file_loader(dir.path()).load(),
            Err(ConfigLoadError::Parse(_))
        ));
    }
}
