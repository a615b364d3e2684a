//! Local filesystem persistence.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use fileuploader_core::error::{AppError, ErrorKind};
use fileuploader_core::result::AppResult;
use fileuploader_core::traits::persist::FilePersister;

/// How temp files reach their destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Rename, falling back to copy and delete across filesystems.
    #[default]
    Move,
    /// Copy, leaving the temp file in place.
    Copy,
}

/// Stores uploads on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalPersister {
    mode: PersistMode,
}

impl LocalPersister {
    /// Create a persister with the given mode.
    pub fn new(mode: PersistMode) -> Self {
        Self { mode }
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> AppResult<u64> {
        fs::copy(from, to).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to copy {} -> {}", from.display(), to.display()),
                e,
            )
        })
    }
}

#[async_trait]
impl FilePersister for LocalPersister {
    async fn persist(&self, temp: &Path, destination: &Path) -> AppResult<()> {
        if !fs::try_exists(temp).await.unwrap_or(false) {
            return Err(AppError::not_found(format!(
                "Uploaded file not found: {}",
                temp.display()
            )));
        }
        self.ensure_parent(destination).await?;

        match self.mode {
            PersistMode::Copy => {
                let bytes = self.copy(temp, destination).await?;
                debug!(destination = %destination.display(), bytes, "Copied upload");
            }
            PersistMode::Move => {
                if let Err(e) = fs::rename(temp, destination).await {
                    debug!(error = %e, "Rename failed, copying instead");
                    self.copy(temp, destination).await?;
                    if let Err(e) = fs::remove_file(temp).await {
                        tracing::warn!(temp = %temp.display(), error = %e, "Failed to remove temp file");
                    }
                }
                debug!(destination = %destination.display(), "Moved upload");
            }
        }
        Ok(())
    }
}
