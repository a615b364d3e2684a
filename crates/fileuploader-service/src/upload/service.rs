//! Upload orchestration for one form field.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use fileuploader_core::config::upload::UploadOptions;
use fileuploader_core::traits::codec::ImageCodec;
use fileuploader_core::traits::persist::FilePersister;
use fileuploader_core::traits::validate::{AcceptAll, FileValidator};
use fileuploader_core::types::chunk::{CHUNK_FIELD, ChunkAck, ChunkDescriptor};
use fileuploader_core::types::editor::EditorParams;
use fileuploader_core::types::file::FileRecord;
use fileuploader_core::types::list::ListInputState;
use fileuploader_core::types::request::{EDITOR_FIELD, RawFile, RequestContext};
use fileuploader_core::types::response::{UploadOutcome, UploadResult};
use fileuploader_core::types::warning::{TransportError, UploadWarning};
use fileuploader_storage::chunked::{ChunkProgress, ChunkReassembler};
use fileuploader_storage::imaging::RasterCodec;
use fileuploader_storage::naming::{NameSource, NamingEngine};
use fileuploader_storage::providers::LocalPersister;

use super::editor::ImagePostProcessor;
use super::reconciler::{self, ListReconciler};
use super::sorter::sort_by_index;
use super::validator::UploadValidator;
use crate::field::UploadField;
use crate::format::format_size;

/// Processes the files submitted under one form field.
///
/// One instance handles one request: it validates the submission, names
/// and stores accepted files, reconciles them with the client's file list,
/// and applies pending image edits.
pub struct UploadService {
    /// Name of the file field.
    field_name: String,
    /// Per-request settings, including the known files.
    options: UploadOptions,
    /// The incoming request.
    context: RequestContext,
    /// Normalized field input; `None` when the field was not submitted.
    field: Option<UploadField>,
    /// The client's current file list.
    list: Option<ListInputState>,
    /// Destination name generator.
    naming: NamingEngine,
    /// Chunk session storage.
    chunks: ChunkReassembler,
    /// Stores accepted files.
    persister: Arc<dyn FilePersister>,
    /// Application-supplied per-file check.
    validator: Arc<dyn FileValidator>,
    /// Image editing after upload.
    post_processor: ImagePostProcessor,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("field_name", &self.field_name)
            .field("upload_dir", &self.options.upload_dir)
            .finish()
    }
}

impl UploadService {
    /// Create a service for `field_name` with local persistence, no custom
    /// validation, and the built-in raster codec.
    pub fn new(field_name: impl Into<String>, options: UploadOptions, context: RequestContext) -> Self {
        let field_name = field_name.into();
        let field = UploadField::from_request(&field_name, &context);
        let list = options
            .list_input
            .post_key(&field_name)
            .and_then(|key| context.field(&key).and_then(ListInputState::parse));

        Self {
            naming: NamingEngine::new(&options.upload_dir, options.replace),
            chunks: ChunkReassembler::new(&options.upload_dir),
            persister: Arc::new(LocalPersister::default()),
            validator: Arc::new(AcceptAll),
            post_processor: ImagePostProcessor::new(Arc::new(RasterCodec)),
            field_name,
            options,
            context,
            field,
            list,
        }
    }

    /// Use a different persistence backend.
    pub fn with_persister(mut self, persister: Arc<dyn FilePersister>) -> Self {
        self.persister = persister;
        self
    }

    /// Run an application-supplied check on every file.
    pub fn with_validator(mut self, validator: Arc<dyn FileValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Use a different image codec for post-processing.
    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.post_processor = ImagePostProcessor::new(codec);
        self
    }

    /// The client's current file list, if one was posted.
    pub fn list_input(&self) -> Option<&ListInputState> {
        self.list.as_ref()
    }

    /// Known files, including those stored by [`upload`](Self::upload).
    pub fn file_list(&self) -> &[FileRecord] {
        &self.options.files
    }

    /// `key` attribute of every known file, falling back to its path.
    pub fn file_list_attribute(&self, key: &str) -> Vec<String> {
        self.options
            .files
            .iter()
            .map(|f| f.attribute(key).unwrap_or_else(|| f.file.clone()))
            .collect()
    }

    /// Remove and return known files the client no longer lists, compared
    /// by their `key` attribute.
    pub fn removed_files(&mut self, key: &str) -> Vec<FileRecord> {
        reconciler::removed_files(self.list.as_ref(), &mut self.options.files, key)
    }

    /// Process the submission.
    ///
    /// Returns [`UploadOutcome::ChunkPending`] when a chunk was stored and
    /// the client must send the next one; otherwise the result of the
    /// whole request.
    pub async fn upload(&mut self) -> UploadOutcome {
        let mut result = UploadResult::default();

        match self.field.clone() {
            None => self.report_missing_field(&mut result),
            Some(field) => {
                let verdict = UploadValidator::new(
                    &self.options,
                    &self.context.limits,
                    self.validator.as_ref(),
                )
                .validate_request(&field, self.context.method);

                match verdict {
                    Err(warning) => {
                        debug!(field = %self.field_name, warning = %warning, "Submission rejected");
                        result.reject(&warning);
                    }
                    Ok(()) => {
                        result.is_success = true;
                        let pending = match self.collect(&field, &mut result).await {
                            Ok(pending) => pending,
                            Err(ack) => return UploadOutcome::ChunkPending(ack),
                        };
                        if !result.has_warnings {
                            self.store(pending, &mut result).await;
                        }
                    }
                }
            }
        }

        self.finish(&mut result).await;
        info!(
            field = %self.field_name,
            success = result.is_success,
            uploaded = result.files.len(),
            warnings = result.warnings.len(),
            "Upload processed"
        );
        UploadOutcome::Completed(result)
    }

    fn report_missing_field(&self, result: &mut UploadResult) {
        if let Some(diagnostic) = self.context.diagnostic {
            result.warn(&diagnostic.warning());
        }
        if self.options.required && self.context.method.is_post_like() {
            result.warn(&UploadWarning::Required);
        }
    }

    /// Validate, name, and reconcile every submitted file.
    ///
    /// Returns the files ready to store, or the chunk handshake when the
    /// submission is an unfinished chunk.
    async fn collect(
        &self,
        field: &UploadField,
        result: &mut UploadResult,
    ) -> Result<Vec<FileRecord>, ChunkAck> {
        let single = field.count() == 1;
        let chunk = single
            .then(|| self.context.field(CHUNK_FIELD).and_then(ChunkDescriptor::parse))
            .flatten();
        let single_editor = (single && self.list.is_none())
            .then(|| self.context.field(EDITOR_FIELD).and_then(EditorParams::parse))
            .flatten();

        let validator = UploadValidator::new(&self.options, &self.context.limits, self.validator.as_ref());
        let mut reconciler = ListReconciler::new(self.list.clone());
        let mut reserved = HashSet::new();
        let mut pending = Vec::new();

        for raw in &field.files {
            let mut raw = raw.clone();
            let mut chunked = None;

            if let Some(descriptor) = &chunk {
                match self.chunks.accept(descriptor, &raw.temp_path).await {
                    Ok(ChunkProgress::Accumulating { token }) => return Err(ChunkAck::new(token)),
                    Ok(ChunkProgress::Skipped) => continue,
                    Ok(ChunkProgress::Complete { path }) => {
                        raw.temp_path = path;
                        raw.name.clone_from(&descriptor.name);
                        raw.mime_type.clone_from(&descriptor.mime_type);
                        raw.size = descriptor.size;
                        chunked = Some(descriptor.clone());
                    }
                    Err(e) => {
                        warn!(name = %raw.name, error = %e, "Failed to store chunk");
                        raw.error = TransportError::WriteFailure.code();
                    }
                }
            }

            let mut file = self.describe(&raw);
            file.chunk = chunked;

            let verdict = match self.assign_name(&mut file, &reserved).await {
                Ok(()) => validator.validate_file(&file),
                Err(warning) => Err(warning),
            };
            let listed = reconciler.expects(&file.old_name);

            match verdict {
                Ok(()) if listed => {
                    if let Some(entry) = reconciler.claim(&file.old_name) {
                        file.editor = entry.editor;
                        file.index = entry.index;
                    } else if single_editor.is_some() {
                        file.editor = single_editor;
                    }
                    reserved.insert(file.name.clone());
                    pending.push(file);
                }
                Ok(()) => {
                    debug!(name = %file.old_name, "File not in client list, dropped");
                    self.discard_chunk(&file).await;
                }
                Err(warning) => {
                    self.discard_chunk(&file).await;
                    if !listed {
                        debug!(name = %file.old_name, warning = %warning, "Unlisted file rejected");
                        continue;
                    }
                    debug!(name = %file.old_name, warning = %warning, "File rejected");
                    result.reject(&warning);
                    pending.clear();
                    break;
                }
            }
        }

        Ok(pending)
    }

    /// Build the record of a submitted file.
    fn describe(&self, raw: &RawFile) -> FileRecord {
        let (title, extension) = split_name(&raw.name);
        let has_editor = self.options.editor.as_ref().is_some_and(|e| e.transforms());

        FileRecord {
            old_name: raw.name.clone(),
            old_title: title.to_string(),
            extension: extension.to_lowercase(),
            mime_type: raw.mime_type.clone(),
            size: raw.size,
            size_label: format_size(raw.size),
            date: Utc::now().to_rfc2822(),
            temp_path: Some(raw.temp_path.clone()),
            error_code: raw.error,
            has_editor,
            ..FileRecord::default()
        }
    }

    async fn assign_name(
        &self,
        file: &mut FileRecord,
        reserved: &HashSet<String>,
    ) -> Result<(), UploadWarning> {
        let source = NameSource {
            title: &file.old_title,
            extension: &file.extension,
            size: file.size,
        };
        let generated = self
            .naming
            .generate(&self.options.title, &source, reserved)
            .map_err(|e| {
                warn!(name = %file.old_name, error = %e, "Name generation failed");
                UploadWarning::NameUnavailable(file.old_name.clone())
            })?;

        let destination = self.options.upload_dir.join(&generated.name);
        file.replaced = tokio::fs::try_exists(&destination).await.unwrap_or(false);
        file.file = destination.to_string_lossy().into_owned();
        file.name = generated.name;
        file.title = generated.title;
        Ok(())
    }

    async fn discard_chunk(&self, file: &FileRecord) {
        if file.is_chunked() {
            if let Some(temp) = &file.temp_path {
                self.chunks.discard(temp).await;
            }
        }
    }

    /// Move pending files into place; only stored files are reported.
    async fn store(&mut self, pending: Vec<FileRecord>, result: &mut UploadResult) {
        for mut file in pending {
            let Some(temp) = file.temp_path.take() else {
                continue;
            };
            let destination = PathBuf::from(&file.file);

            let stored = if file.is_chunked() {
                rename(&temp, &destination).await
            } else {
                self.persister
                    .persist(&temp, &destination)
                    .await
                    .map_err(|e| e.to_string())
            };

            match stored {
                Ok(()) => {
                    file.uploaded = true;
                    file.chunk = None;
                    result.files.push(file.clone());
                    self.options.files.push(file);
                }
                Err(e) => {
                    warn!(name = %file.name, destination = %destination.display(), error = %e, "Failed to store upload");
                    if file.is_chunked() {
                        self.chunks.discard(&temp).await;
                    }
                    if self.options.report_persist_failures {
                        result.warn(&UploadWarning::PersistFailed(file.old_name.clone()));
                    }
                }
            }
        }
    }

    /// Apply list carry-over, image edits, and sort order.
    async fn finish(&mut self, result: &mut UploadResult) {
        if let Some(list) = &self.list {
            reconciler::merge_known(list, &mut self.options.files);
        }

        let edited = self
            .post_processor
            .process(&mut self.options.files, self.options.editor.as_ref())
            .await;
        if edited > 0 {
            debug!(field = %self.field_name, edited, "Images edited");
            for file in result.files.iter_mut() {
                if let Some(known) = self.options.files.iter().find(|k| k.file == file.file) {
                    file.clone_from(known);
                }
            }
        }

        sort_by_index(&mut self.options.files);
        sort_by_index(&mut result.files);
    }
}

/// Split a file name into title and extension at the last dot.
fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((title, extension)) if !title.is_empty() => (title, extension),
        _ => (name, ""),
    }
}

async fn rename(from: &Path, to: &Path) -> Result<(), String> {
    tokio::fs::rename(from, to).await.map_err(|e| e.to_string())
}
