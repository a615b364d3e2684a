//! Upload pipeline options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::editor::CropMode;
use crate::types::file::FileRecord;

/// Default length of generated random name segments.
pub const DEFAULT_RANDOM_LENGTH: usize = 12;

/// Options governing how one upload field is validated, named, stored,
/// and post-processed.
///
/// Sizes are expressed in megabytes (10^6 bytes) and are optional; `None`
/// disables the corresponding check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Maximum number of files, counting files already known.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Maximum total size of a submission, and of every single file.
    #[serde(default)]
    pub max_size: Option<f64>,
    /// Maximum size of one file.
    #[serde(default)]
    pub file_max_size: Option<f64>,
    /// Allowed extensions or mime types (case-insensitive).
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    /// Reject POST submissions without any file.
    #[serde(default)]
    pub required: bool,
    /// Destination directory.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Naming policy for stored files.
    #[serde(default)]
    pub title: TitlePolicy,
    /// Overwrite existing files instead of renaming.
    #[serde(default)]
    pub replace: bool,
    /// Image editor settings; `None` disables post-processing of new uploads.
    #[serde(default = "default_editor")]
    pub editor: Option<EditorOptions>,
    /// Where to read the client's current file list.
    #[serde(default)]
    pub list_input: ListInputSource,
    /// Files already known from earlier requests.
    #[serde(default)]
    pub files: Vec<FileRecord>,
    /// Report a warning when a validated file cannot be stored.
    #[serde(default)]
    pub report_persist_failures: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            limit: None,
            max_size: None,
            file_max_size: None,
            extensions: None,
            required: false,
            upload_dir: default_upload_dir(),
            title: TitlePolicy::default(),
            replace: false,
            editor: default_editor(),
            list_input: ListInputSource::default(),
            files: Vec::new(),
            report_persist_failures: false,
        }
    }
}

/// Image editor settings applied to uploaded images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorOptions {
    /// Target width in pixels.
    #[serde(default)]
    pub max_width: Option<u32>,
    /// Target height in pixels.
    #[serde(default)]
    pub max_height: Option<u32>,
    /// Crop applied when a file carries no crop of its own.
    #[serde(default)]
    pub crop: CropMode,
    /// Encoder quality, 0-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            crop: CropMode::None,
            quality: default_quality(),
        }
    }
}

impl EditorOptions {
    /// Whether these settings alone ask for any transformation.
    pub fn transforms(&self) -> bool {
        self.max_width.is_some() || self.max_height.is_some() || !self.crop.is_none()
    }
}

/// Strategy for the stem of generated file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePolicy {
    /// A random string.
    Auto,
    /// The original file title.
    Name,
    /// A literal name or a template with `{placeholders}`.
    Template(String),
}

impl NamePolicy {
    fn parse(raw: &str) -> Self {
        match raw {
            "" | "auto" => Self::Auto,
            "name" => Self::Name,
            other => Self::Template(other.to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Auto => "auto",
            Self::Name => "name",
            Self::Template(template) => template,
        }
    }
}

/// Naming policy plus the length of random segments.
///
/// Deserializes from `"auto"`, `"name"`, a template string, or a
/// `[policy, random_length]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TitleSetting", into = "TitleSetting")]
pub struct TitlePolicy {
    /// Name stem strategy.
    pub policy: NamePolicy,
    /// Length of `{random}` segments and of automatic names.
    pub random_length: usize,
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self {
            policy: NamePolicy::Auto,
            random_length: DEFAULT_RANDOM_LENGTH,
        }
    }
}

impl TitlePolicy {
    /// Build a policy from its textual form.
    pub fn new(policy: &str, random_length: usize) -> Self {
        Self {
            policy: NamePolicy::parse(policy),
            random_length,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TitleSetting {
    Plain(String),
    WithLength(String, usize),
}

impl From<TitleSetting> for TitlePolicy {
    fn from(setting: TitleSetting) -> Self {
        match setting {
            TitleSetting::Plain(policy) => Self::new(&policy, DEFAULT_RANDOM_LENGTH),
            TitleSetting::WithLength(policy, length) => Self::new(&policy, length),
        }
    }
}

impl From<TitlePolicy> for TitleSetting {
    fn from(policy: TitlePolicy) -> Self {
        TitleSetting::WithLength(policy.policy.as_str().to_string(), policy.random_length)
    }
}

/// Location of the client's current file list among the post fields.
///
/// `true` reads `fileuploader-list-<field>`, a string names the post field
/// directly, `false` disables list reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ListInputSetting", into = "ListInputSetting")]
pub enum ListInputSource {
    /// No list state is read.
    Disabled,
    /// The conventional `fileuploader-list-<field>` post field.
    #[default]
    Default,
    /// A custom post field name.
    Named(String),
}

impl ListInputSource {
    /// Post field carrying the list for `field`, if reconciliation is enabled.
    pub fn post_key(&self, field: &str) -> Option<String> {
        match self {
            Self::Disabled => None,
            Self::Default => Some(format!("fileuploader-list-{field}")),
            Self::Named(name) => Some(name.clone()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ListInputSetting {
    Flag(bool),
    Named(String),
}

impl From<ListInputSetting> for ListInputSource {
    fn from(setting: ListInputSetting) -> Self {
        match setting {
            ListInputSetting::Flag(true) => Self::Default,
            ListInputSetting::Flag(false) => Self::Disabled,
            ListInputSetting::Named(name) => Self::Named(name),
        }
    }
}

impl From<ListInputSource> for ListInputSetting {
    fn from(source: ListInputSource) -> Self {
        match source {
            ListInputSource::Disabled => Self::Flag(false),
            ListInputSource::Default => Self::Flag(true),
            ListInputSource::Named(name) => Self::Named(name),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_editor() -> Option<EditorOptions> {
    Some(EditorOptions::default())
}

fn default_quality() -> u8 {
    98
}
