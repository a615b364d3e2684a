//! Chunk session reassembly.
//!
//! A session starts when a chunk flagged `isFirst` arrives: a token is
//! minted and the chunk is written to `.unconfirmed_<token>` inside the
//! upload directory. Later chunks carry the token and are appended. The
//! chunk flagged `isLast` completes the session.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use fileuploader_core::error::{AppError, ErrorKind};
use fileuploader_core::result::AppResult;
use fileuploader_core::types::chunk::{ChunkDescriptor, UNCONFIRMED_PREFIX};

use crate::naming::{random_string, sanitize_filename};

/// Result of accepting one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkProgress {
    /// The chunk was stored; the client must send the next one with `token`.
    Accumulating {
        /// Session token.
        token: String,
    },
    /// No session matches the chunk; nothing was written.
    Skipped,
    /// The final chunk was stored; the whole file is at `path`.
    Complete {
        /// Reassembled file.
        path: PathBuf,
    },
}

/// Appends chunks into per-session accumulation files.
#[derive(Debug, Clone)]
pub struct ChunkReassembler {
    /// Directory holding accumulation files.
    upload_dir: PathBuf,
}

impl ChunkReassembler {
    /// Create a reassembler writing into `upload_dir`.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Mint a session token: six random characters followed by the Unix
    /// timestamp.
    pub fn mint_token() -> String {
        format!("{}{}", random_string(6), Utc::now().timestamp())
    }

    /// Accumulation file for `token`.
    pub fn accumulation_path(&self, token: &str) -> PathBuf {
        self.upload_dir
            .join(format!("{UNCONFIRMED_PREFIX}{}", sanitize_filename(token)))
    }

    /// Append the chunk stored at `chunk_path` to its session.
    pub async fn accept(&self, chunk: &ChunkDescriptor, chunk_path: &Path) -> AppResult<ChunkProgress> {
        let token = if chunk.is_first {
            Self::mint_token()
        } else {
            match chunk.temp_name.as_deref() {
                Some(token) if !token.is_empty() => token.to_string(),
                _ => {
                    tracing::debug!(name = %chunk.name, "Chunk without session token skipped");
                    return Ok(ChunkProgress::Skipped);
                }
            }
        };

        let target = self.accumulation_path(&token);
        if !chunk.is_first && !fs::try_exists(&target).await.unwrap_or(false) {
            tracing::debug!(token = %token, "Chunk for unknown session skipped");
            return Ok(ChunkProgress::Skipped);
        }

        let bytes = self.append(&target, chunk_path, chunk.is_first).await?;
        tracing::debug!(
            token = %token,
            bytes,
            first = chunk.is_first,
            last = chunk.is_last,
            "Stored chunk"
        );

        if chunk.is_last {
            Ok(ChunkProgress::Complete { path: target })
        } else {
            Ok(ChunkProgress::Accumulating { token })
        }
    }

    /// Remove an accumulation file, ignoring files that are already gone.
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to discard chunk file");
            }
        }
    }

    async fn append(&self, target: &Path, chunk_path: &Path, truncate: bool) -> AppResult<u64> {
        let mut options = fs::OpenOptions::new();
        if truncate {
            options.write(true).create(true).truncate(true);
        } else {
            options.append(true);
        }

        let mut output = options.open(target).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to open chunk file: {}", target.display()),
                e,
            )
        })?;
        let mut input = fs::File::open(chunk_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to open uploaded chunk: {}", chunk_path.display()),
                e,
            )
        })?;

        let bytes = tokio::io::copy(&mut input, &mut output)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to append chunk", e))?;
        output
            .flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush chunk file", e))?;
        Ok(bytes)
    }
}
