use async_trait::async_trait;
use council_application::{FileWriteError, FileWriter};
use std::path::Path;
use tracing::debug;

/// Writes output files with `tokio::fs`, creating parent directories first.
///
/// Existing files are overwritten.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileWriter;

impl LocalFileWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileWriter for LocalFileWriter {
    async fn save_to_file(&self, content: &str, path: &Path) -> Result<(), FileWriteError> {
        if path.file_name().is_none() {
            return Err(FileWriteError::Rejected {
                path: path.to_path_buf(),
                reason: "path has no file name".to_string(),
            });
        }

        let io_err = |source| FileWriteError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        tokio::fs::write(path, content).await.map_err(io_err)?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote output file");
        Ok(())
    }
}
