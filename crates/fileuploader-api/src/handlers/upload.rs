//! Multipart upload handler.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::{Method, StatusCode};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use fileuploader_core::error::{AppError, ErrorKind};
use fileuploader_core::types::request::{
    EnvironmentDiagnostic, HttpMethod, RawFile, RawFileInput, RequestContext,
};
use fileuploader_core::types::response::UploadOutcome;
use fileuploader_service::UploadService;

use crate::error::ApiError;
use crate::state::AppState;

/// POST|PUT /upload
///
/// Parts named like the configured file field (with or without a `[]`
/// suffix) are spooled to temporary files; all other parts become post
/// fields. A body over the configured limit, or more file parts than the
/// server accepts, is reported through the upload result instead of an
/// HTTP error.
pub async fn upload(
    State(state): State<AppState>,
    method: Method,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, ApiError> {
    let server = &state.config.server;
    let temp_dir = server.temp_dir.clone().unwrap_or_else(std::env::temp_dir);

    let mut intake = Intake::default();
    let max_files = state.config.limits.max_file_uploads;
    let diagnostic = match intake
        .read(&mut multipart, &server.field_name, max_files, &temp_dir)
        .await
    {
        Ok(()) => None,
        Err(IntakeError::TooLarge) => {
            intake = Intake::default();
            Some(EnvironmentDiagnostic::PostSizeExceeded)
        }
        Err(IntakeError::TooManyFiles) => {
            intake = Intake::default();
            Some(EnvironmentDiagnostic::TooManyFiles)
        }
        Err(IntakeError::Multipart(e)) => {
            return Err(AppError::validation(format!("Multipart error: {e}")).into());
        }
        Err(IntakeError::Storage(e)) => return Err(e.into()),
    };
    debug!(
        files = intake.files.as_ref().map_or(0, Vec::len),
        fields = intake.fields.len(),
        "Multipart intake complete"
    );

    let mut context = RequestContext::new(HttpMethod::parse(method.as_str()), state.config.limits.clone());
    if let Some(files) = intake.files.take() {
        context = context.with_files(server.field_name.clone(), RawFileInput::List(files));
    }
    context.fields = std::mem::take(&mut intake.fields);
    if let Some(diagnostic) = diagnostic {
        context = context.with_diagnostic(diagnostic);
    }

    let mut service = UploadService::new(server.field_name.clone(), state.config.upload.clone(), context)
        .with_persister(Arc::clone(&state.persister))
        .with_validator(Arc::clone(&state.validator))
        .with_codec(Arc::clone(&state.codec));
    let outcome = service.upload().await;

    Ok(Json(outcome))
}

/// Parts read from one multipart body.
///
/// Spooled files are deleted when the intake is dropped unless the
/// pipeline has moved them into place.
#[derive(Default)]
struct Intake {
    /// File parts of the upload field; `None` when the field never appeared.
    files: Option<Vec<RawFile>>,
    /// Plain text parts.
    fields: HashMap<String, String>,
    /// Guards for spooled temp files.
    spooled: Vec<TempPath>,
}

enum IntakeError {
    /// The body exceeded the configured limit.
    TooLarge,
    /// More file parts than `max_file_uploads`.
    TooManyFiles,
    Multipart(MultipartError),
    Storage(AppError),
}

impl From<MultipartError> for IntakeError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge
        } else {
            Self::Multipart(err)
        }
    }
}

impl From<AppError> for IntakeError {
    fn from(err: AppError) -> Self {
        Self::Storage(err)
    }
}

impl Intake {
    async fn read(
        &mut self,
        multipart: &mut Multipart,
        field_name: &str,
        max_files: usize,
        temp_dir: &Path,
    ) -> Result<(), IntakeError> {
        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let is_file_part = name == field_name || name.strip_suffix("[]") == Some(field_name);

            match field.file_name().map(str::to_string) {
                Some(file_name) if is_file_part => {
                    let files = self.files.get_or_insert_with(Vec::new);
                    if file_name.is_empty() {
                        continue;
                    }
                    if max_files != 0 && files.len() >= max_files {
                        return Err(IntakeError::TooManyFiles);
                    }
                    let mime_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let (temp, size) = spool(&mut field, temp_dir).await?;
                    files.push(RawFile {
                        name: file_name,
                        temp_path: temp.to_path_buf(),
                        mime_type,
                        error: 0,
                        size,
                    });
                    self.spooled.push(temp);
                }
                _ => {
                    let value = field.text().await?;
                    self.fields.insert(name, value);
                }
            }
        }
        Ok(())
    }
}

/// Stream a file part into a new temp file, returning its guard and size.
async fn spool(field: &mut Field<'_>, dir: &Path) -> Result<(TempPath, u64), IntakeError> {
    let temp = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(dir)
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create temp file in {}", dir.display()),
                e,
            )
        })?;
    let (file, path) = temp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to spool upload", e))?;
        size += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush upload", e))?;

    Ok((path, size))
}
