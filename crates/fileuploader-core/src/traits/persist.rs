//! Persistence of validated uploads.

use std::path::Path;

use async_trait::async_trait;

use crate::result::AppResult;

/// Moves or copies an uploaded temp file to its final destination.
///
/// The [`FilePersister`] trait is defined here in `fileuploader-core` and
/// implemented for the local filesystem in `fileuploader-storage`.
#[async_trait]
pub trait FilePersister: Send + Sync + std::fmt::Debug + 'static {
    /// Store the bytes at `temp` under `destination`.
    async fn persist(&self, temp: &Path, destination: &Path) -> AppResult<()>;
}
