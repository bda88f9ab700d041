//! Run parameters: use case input control.
//!
//! [`RunParams`] groups the per-run settings consumed by the
//! [`Orchestrator`](crate::use_cases::run_orchestration::Orchestrator).
//! Admission bounds live in [`RateLimitConfig`](crate::rate_limit::RateLimitConfig).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-run settings
#[derive(Clone, Serialize, Deserialize)]
pub struct RunParams {
    /// Model aliases to fan out to, in request order
    pub models: Vec<String>,
    /// Model that merges the successful outputs; `None` disables synthesis
    pub synthesis_model: Option<String>,
    /// Directory receiving one markdown file per model
    pub output_dir: PathBuf,
    /// Overrides every provider's configured key source
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Overrides every provider's base URL
    pub endpoint: Option<String>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            synthesis_model: None,
            output_dir: PathBuf::from("council-output"),
            api_key: None,
            endpoint: None,
        }
    }
}

impl fmt::Debug for RunParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunParams")
            .field("models", &self.models)
            .field("synthesis_model", &self.synthesis_model)
            .field("output_dir", &self.output_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl RunParams {
    pub fn new(models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            models: models.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.synthesis_model = Some(model.into().trim().to_string());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    // ==================== Queries ====================

    /// Requested models with duplicates and blanks removed, first
    /// occurrence kept
    pub fn unique_models(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.models
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty() && seen.insert(*m))
            .map(str::to_string)
            .collect()
    }

    /// Trimmed synthesis model, or `None` when synthesis is disabled
    pub fn synthesis_model(&self) -> Option<&str> {
        self.synthesis_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    pub fn synthesis_enabled(&self) -> bool {
        self.synthesis_model().is_some()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
