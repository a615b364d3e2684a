//! Image transformation capability.

use std::path::PathBuf;

use crate::types::editor::CropMode;

/// Parameters of a single resize/crop/rotate operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeRequest {
    /// Image to read.
    pub source: PathBuf,
    /// Where to write the result; `None` overwrites the source.
    pub destination: Option<PathBuf>,
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
    /// Crop applied before resampling.
    pub crop: CropMode,
    /// Encoder quality, 0-100.
    pub quality: u8,
    /// Clockwise rotation in degrees.
    pub rotation: i32,
}

impl ResizeRequest {
    /// Request an in-place edit of `source` with default quality.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: None,
            width: None,
            height: None,
            crop: CropMode::None,
            quality: 90,
            rotation: 0,
        }
    }

    /// Path the result is written to.
    pub fn output_path(&self) -> &std::path::Path {
        self.destination.as_deref().unwrap_or(&self.source)
    }
}

/// Decodes, transforms, and re-encodes images.
///
/// Implementations are CPU-bound and blocking; async callers run them on
/// the blocking thread pool.
pub trait ImageCodec: Send + Sync + 'static {
    /// Apply `request`. Returns `false` when nothing was written, leaving
    /// the source untouched.
    fn resize(&self, request: &ResizeRequest) -> bool;
}
