//! Application-supplied per-file checks.

use crate::config::upload::UploadOptions;
use crate::types::file::FileRecord;

/// Custom check run after all built-in per-file checks pass.
///
/// Returning `Err(message)` rejects the file; the message is reported to
/// the client verbatim.
pub trait FileValidator: Send + Sync {
    /// Check one file.
    fn validate(&self, file: &FileRecord, options: &UploadOptions) -> Result<(), String>;
}

/// Validator that accepts every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl FileValidator for AcceptAll {
    fn validate(&self, _file: &FileRecord, _options: &UploadOptions) -> Result<(), String> {
        Ok(())
    }
}

impl<F> FileValidator for F
where
    F: Fn(&FileRecord, &UploadOptions) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, file: &FileRecord, options: &UploadOptions) -> Result<(), String> {
        self(file, options)
    }
}
