//! Image editor parameters.

use serde::{Deserialize, Serialize};

/// Explicit crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge.
    #[serde(default)]
    pub left: f64,
    /// Top edge.
    #[serde(default)]
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// How the source image is cropped before resampling.
///
/// Deserializes from `false` (none), `true` (auto-crop to the target aspect
/// ratio), or a `{left, top, width, height}` object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "CropSetting", into = "CropSetting")]
pub enum CropMode {
    /// Use the whole image.
    #[default]
    None,
    /// Shrink the longer side to the target aspect ratio.
    Auto,
    /// Use the given rectangle.
    Rect(CropRect),
}

impl CropMode {
    /// Whether no crop was requested.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CropSetting {
    Flag(bool),
    Rect(CropRect),
}

impl From<CropSetting> for CropMode {
    fn from(setting: CropSetting) -> Self {
        match setting {
            CropSetting::Flag(false) => Self::None,
            CropSetting::Flag(true) => Self::Auto,
            CropSetting::Rect(rect) => Self::Rect(rect),
        }
    }
}

impl From<CropMode> for CropSetting {
    fn from(mode: CropMode) -> Self {
        match mode {
            CropMode::None => Self::Flag(false),
            CropMode::Auto => Self::Flag(true),
            CropMode::Rect(rect) => Self::Rect(rect),
        }
    }
}

/// Per-file edits requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorParams {
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: i32,
    /// Crop rectangle overriding the configured crop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
}

impl EditorParams {
    /// Parse the JSON editor value sent alongside a single-file upload.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
