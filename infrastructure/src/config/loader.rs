//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use council_application::ConfigLoadError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["council.toml", ".council.toml"];

/// Configuration loader that handles file discovery and merging
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    explicit: Option<PathBuf>,
    project_dir: PathBuf,
    global_path: Option<PathBuf>,
    read_env: bool,
}

impl ConfigLoader {
    /// Loader using the working directory and the user config directory
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            project_dir: PathBuf::from("."),
            global_path: Self::global_config_path(),
            read_env: true,
        }
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Skip `COUNCIL_RUN_*` overrides
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub fn explicit_path(&self) -> Option<&Path> {
        self.explicit.as_deref()
    }

    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `COUNCIL_RUN_*` environment variables (`[run]` table only)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./council.toml` or `./.council.toml`
    /// 4. Global: `<config_dir>/council/models.toml`
    /// 5. Default values
    pub fn load(&self) -> Result<FileConfig, ConfigLoadError> {
        if let Some(path) = &self.explicit
            && !path.exists()
        {
            return Err(ConfigLoadError::NotFound(path.display().to_string()));
        }

        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        for path in self.sources() {
            figment = figment.merge(Toml::file(path));
        }
        if self.read_env {
            figment = figment.merge(
                Env::prefixed("COUNCIL_RUN_").map(|key| format!("run.{}", key).into()),
            );
        }

        figment
            .extract()
            .map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Existing config files, lowest priority first
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources = Vec::new();

        if let Some(global) = &self.global_path
            && global.exists()
        {
            sources.push(global.clone());
        }
        if let Some(project) = self.project_config_path() {
            sources.push(project);
        }
        if let Some(explicit) = &self.explicit
            && explicit.exists()
        {
            sources.push(explicit.clone());
        }

        sources
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("council").join("models.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path(&self) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| self.project_dir.join(name))
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn isolated(dir: &Path) -> ConfigLoader {
        ConfigLoader::new(None)
            .with_project_dir(dir)
            .with_global_path(None)
            .without_env()
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(!config.has_catalog());
        assert_eq!(config.run.max_concurrent, 4);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("council/models.toml"));
    }

    #[test]
    fn test_no_files_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = isolated(dir.path()).load().unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_project_file_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "[run]\nmax_concurrent = 9\nsynthesis_model = \"g\"\n").unwrap();
        fs::write(dir.path().join(".council.toml"), "[run]\nmax_concurrent = 3\n").unwrap();

        let config = isolated(dir.path())
            .with_global_path(Some(global))
            .load()
            .unwrap();

        assert_eq!(config.run.max_concurrent, 3);
        // Untouched keys still come from the global file
        assert_eq!(config.run.synthesis_model.as_deref(), Some("g"));
    }

    #[test]
    fn test_explicit_path_has_highest_file_priority() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("council.toml"), "[run]\nmax_concurrent = 3\n").unwrap();
        let explicit = dir.path().join("custom.toml");
        fs::write(&explicit, "[run]\nmax_concurrent = 7\n").unwrap();

        let loader = ConfigLoader::new(Some(explicit))
            .with_project_dir(dir.path())
            .with_global_path(None)
            .without_env();

        assert_eq!(loader.load().unwrap().run.max_concurrent, 7);
        assert_eq!(loader.sources().len(), 2);
    }

    #[test]
    fn test_missing_explicit_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(Some(dir.path().join("nope.toml")))
            .with_project_dir(dir.path())
            .without_env();

        assert!(matches!(loader.load(), Err(ConfigLoadError::NotFound(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("council.toml"), "[run]\nmax_concurrent = \"many\"\n").unwrap();

        let err = isolated(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }
}
