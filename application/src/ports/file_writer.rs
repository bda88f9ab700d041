//! Output file port

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileWriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refused to write {path}: {reason}")]
    Rejected { path: PathBuf, reason: String },
}

/// Persists generated content.
///
/// Directory creation and permissions are the implementation's business.
#[async_trait]
pub trait FileWriter: Send + Sync {
    async fn save_to_file(&self, content: &str, path: &Path) -> Result<(), FileWriteError>;
}
