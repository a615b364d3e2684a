//! Post-upload image editing.

use std::sync::Arc;

use tracing::{debug, warn};

use fileuploader_core::config::upload::EditorOptions;
use fileuploader_core::traits::codec::{ImageCodec, ResizeRequest};
use fileuploader_core::types::editor::CropMode;
use fileuploader_core::types::file::FileRecord;

/// Quality used when no editor settings are configured.
const DEFAULT_QUALITY: u8 = 90;

/// Applies pending resize, crop, and rotation edits to stored images.
#[derive(Clone)]
pub struct ImagePostProcessor {
    codec: Arc<dyn ImageCodec>,
}

impl std::fmt::Debug for ImagePostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePostProcessor").finish()
    }
}

impl ImagePostProcessor {
    /// Create a post-processor around an image codec.
    pub fn new(codec: Arc<dyn ImageCodec>) -> Self {
        Self { codec }
    }

    /// Edit every eligible file in place.
    ///
    /// A file is eligible when it carries editor parameters or was flagged
    /// for the configured transforms, its type is `image/*`, and it exists
    /// on disk. Edited files have their pending edits cleared. Codec
    /// failures leave the file untouched. Returns the number of files
    /// rewritten.
    pub async fn process(&self, files: &mut [FileRecord], options: Option<&EditorOptions>) -> usize {
        let mut edited = 0;

        for file in files.iter_mut() {
            if file.editor.is_none() && !file.has_editor {
                continue;
            }
            if !file.mime_type.starts_with("image/") {
                continue;
            }
            let is_file = tokio::fs::metadata(&file.file)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                debug!(file = %file.file, "Skipping edit of missing image");
                continue;
            }

            let request = resize_request(file, options);
            let codec = Arc::clone(&self.codec);
            let written = match tokio::task::spawn_blocking(move || codec.resize(&request)).await {
                Ok(written) => written,
                Err(e) => {
                    warn!(file = %file.file, error = %e, "Image edit task panicked");
                    false
                }
            };

            file.editor = None;
            file.has_editor = false;
            if written {
                edited += 1;
            }
        }

        edited
    }
}

fn resize_request(file: &FileRecord, options: Option<&EditorOptions>) -> ResizeRequest {
    let params = file.editor.unwrap_or_default();

    let mut request = ResizeRequest::new(&file.file);
    request.width = options.and_then(|o| o.max_width);
    request.height = options.and_then(|o| o.max_height);
    request.crop = match params.crop {
        Some(rect) => CropMode::Rect(rect),
        None => options.map(|o| o.crop).unwrap_or_default(),
    };
    request.quality = options.map_or(DEFAULT_QUALITY, |o| o.quality);
    request.rotation = params.rotation;
    request
}
