//! Runtime settings from TOML (`[run]` section)

use council_application::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Raw `[run]` configuration
///
/// Every field can be overridden with a `COUNCIL_RUN_<FIELD>` environment
/// variable (e.g. `COUNCIL_RUN_MAX_CONCURRENT=8`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRunConfig {
    /// Base directory for run outputs; a timestamped subdirectory is used
    /// when unset
    pub output_dir: Option<PathBuf>,
    /// Global bound on in-flight model calls (0 = unbounded)
    pub max_concurrent: usize,
    /// Per-provider bounds
    pub provider_limits: HashMap<String, usize>,
    /// How long a model may wait for an admission slot
    pub admission_timeout_secs: Option<u64>,
    /// Default synthesis model
    pub synthesis_model: Option<String>,
    /// JSONL audit trail location
    pub audit_log: Option<PathBuf>,
}

impl Default for FileRunConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            max_concurrent: 4,
            provider_limits: HashMap::new(),
            admission_timeout_secs: None,
            synthesis_model: None,
            audit_log: None,
        }
    }
}

impl FileRunConfig {
    /// Admission bounds, with an optional override of the global bound
    pub fn rate_limit_config(&self, max_concurrent: Option<usize>) -> RateLimitConfig {
        RateLimitConfig {
            max_concurrent: max_concurrent.unwrap_or(self.max_concurrent),
            provider_limits: self.provider_limits.clone(),
            admission_timeout: self.admission_timeout_secs.map(Duration::from_secs),
        }
    }
}
