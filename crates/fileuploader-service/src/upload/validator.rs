//! Request-level and per-file upload checks.

use std::path::Path;

use fileuploader_core::config::limits::ServerLimits;
use fileuploader_core::config::upload::UploadOptions;
use fileuploader_core::traits::validate::FileValidator;
use fileuploader_core::types::file::FileRecord;
use fileuploader_core::types::request::HttpMethod;
use fileuploader_core::types::warning::{TransportError, UploadWarning};

use crate::field::UploadField;

/// Checks submissions against configured and environment limits.
///
/// Every check returns the first failing warning; the caller decides what
/// to do with it.
pub struct UploadValidator<'a> {
    options: &'a UploadOptions,
    limits: &'a ServerLimits,
    custom: &'a dyn FileValidator,
}

impl<'a> UploadValidator<'a> {
    /// Create a validator over the given settings.
    pub fn new(
        options: &'a UploadOptions,
        limits: &'a ServerLimits,
        custom: &'a dyn FileValidator,
    ) -> Self {
        Self {
            options,
            limits,
            custom,
        }
    }

    /// Check the submission as a whole.
    ///
    /// In order: uploads enabled, required file present, file count, upload
    /// directory writable, total size against the request cap, total size
    /// against `max_size`.
    pub fn validate_request(
        &self,
        field: &UploadField,
        method: HttpMethod,
    ) -> Result<(), UploadWarning> {
        if !self.limits.uploads_enabled {
            return Err(UploadWarning::UploadsDisabled);
        }

        let count = field.count();
        let known = self.options.files.len();
        if self.options.required && method.is_post_like() && count + known == 0 {
            return Err(UploadWarning::Required);
        }

        let over_limit = self.options.limit.is_some_and(|limit| count + known > limit);
        let over_env = self.limits.max_file_uploads != 0 && count > self.limits.max_file_uploads;
        if over_limit || over_env {
            return Err(UploadWarning::TooManyFiles);
        }

        if !is_writable_dir(&self.options.upload_dir) {
            return Err(UploadWarning::InvalidFolder);
        }

        let total = megabytes(field.total_size());
        if self.limits.max_post_size_mb != 0 && total > self.limits.max_post_size_mb as f64 {
            return Err(UploadWarning::PostTooLarge);
        }
        if self.options.max_size.is_some_and(|max| total > max) {
            return Err(UploadWarning::FilesTooBig);
        }

        Ok(())
    }

    /// Check one file.
    ///
    /// In order: transport error code, environment size limit, extension or
    /// mime allow-list, `file_max_size`, `max_size`, and finally the custom
    /// validator.
    pub fn validate_file(&self, file: &FileRecord) -> Result<(), UploadWarning> {
        if let Some(error) = TransportError::from_code(file.error_code) {
            return Err(error.into());
        }

        // The server cap bounds one transport part; a reassembled chunk
        // session is larger than any part that produced it.
        let size = megabytes(file.size);
        if !file.is_chunked()
            && self.limits.max_upload_size_mb != 0
            && size > self.limits.max_upload_size_mb as f64
        {
            return Err(TransportError::ServerLimit.into());
        }

        if let Some(allowed) = &self.options.extensions {
            let accepted = allowed.iter().any(|entry| {
                entry.eq_ignore_ascii_case(&file.extension)
                    || entry.eq_ignore_ascii_case(&file.mime_type)
            });
            if !accepted {
                return Err(UploadWarning::FileType(file.old_name.clone()));
            }
        }

        if self.options.file_max_size.is_some_and(|max| size > max)
            || self.options.max_size.is_some_and(|max| size > max)
        {
            return Err(UploadWarning::FileTooLarge(file.old_name.clone()));
        }

        self.custom
            .validate(file, self.options)
            .map_err(UploadWarning::Custom)
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000.0
}

fn is_writable_dir(dir: &Path) -> bool {
    std::fs::metadata(dir)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false)
}
