//! Sweep of abandoned chunk sessions.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use fileuploader_core::error::{AppError, ErrorKind};
use fileuploader_core::result::AppResult;
use fileuploader_core::types::chunk::UNCONFIRMED_PREFIX;

/// Deletes unconfirmed chunk files that stopped receiving data.
///
/// Only regular files named with the unconfirmed chunk prefix are touched,
/// so the sweep can run while uploads are in progress.
#[derive(Debug, Clone)]
pub struct StaleChunkSweeper {
    /// Directory holding accumulation files.
    dir: PathBuf,
}

impl StaleChunkSweeper {
    /// Create a sweeper for `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Delete chunk files last modified more than `max_age` ago.
    ///
    /// Returns the number of files removed. A missing directory removes
    /// nothing.
    pub async fn sweep(&self, max_age: Duration) -> AppResult<u64> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Ok(0);
        }

        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid chunk age", e))?;
        let cutoff = Utc::now() - max_age;

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read upload dir: {}", self.dir.display()),
                e,
            )
        })?;

        let mut removed = 0u64;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if !entry
                .file_name()
                .to_string_lossy()
                .starts_with(UNCONFIRMED_PREFIX)
            {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let modified: chrono::DateTime<Utc> = modified.into();
            if !metadata.is_file() || modified >= cutoff {
                continue;
            }

            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale chunk"),
            }
        }

        if removed > 0 {
            tracing::info!(dir = %self.dir.display(), removed, "Removed stale chunk files");
        }
        Ok(removed)
    }
}
