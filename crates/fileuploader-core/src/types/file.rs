//! The per-file lifecycle record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::chunk::ChunkDescriptor;
use super::editor::EditorParams;

/// One file's state from validation through storage.
///
/// The serialized shape is what clients receive in upload results and what
/// callers supply as known files from earlier requests. Fields marked
/// `skip` only live for the duration of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    /// Generated file name, including extension.
    pub name: String,
    /// Generated name without extension.
    pub title: String,
    /// Name as submitted by the client.
    pub old_name: String,
    /// Submitted name without extension.
    pub old_title: String,
    /// Lowercased extension of the submitted name.
    pub extension: String,
    /// Declared mime type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Human readable size.
    #[serde(rename = "size2")]
    pub size_label: String,
    /// Destination path.
    pub file: String,
    /// Whether an existing file was overwritten.
    pub replaced: bool,
    /// RFC 2822 timestamp of processing.
    pub date: String,
    /// Pending image edits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorParams>,
    /// Client-side sort position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    /// Set once the file is stored at `file`.
    pub uploaded: bool,
    /// Opaque application data attached to known files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Temporary location of the uploaded bytes.
    #[serde(skip)]
    pub temp_path: Option<PathBuf>,
    /// Transport error code reported for the upload.
    #[serde(skip)]
    pub error_code: u16,
    /// Chunk session that produced the file.
    #[serde(skip)]
    pub chunk: Option<ChunkDescriptor>,
    /// Whether editor settings were active when the file was uploaded.
    #[serde(skip)]
    pub has_editor: bool,
}

impl FileRecord {
    /// Look up an identifying attribute by key.
    ///
    /// Values in `data` take precedence over the record's own fields.
    pub fn attribute(&self, key: &str) -> Option<String> {
        if let Some(value) = self.data.as_ref().and_then(|d| d.get(key)) {
            return match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
        }

        match key {
            "file" => Some(self.file.clone()),
            "name" => Some(self.name.clone()),
            "title" => Some(self.title.clone()),
            "old_name" => Some(self.old_name.clone()),
            "old_title" => Some(self.old_title.clone()),
            "extension" => Some(self.extension.clone()),
            "type" => Some(self.mime_type.clone()),
            _ => None,
        }
    }

    /// Whether this record was produced by a completed chunk session.
    pub fn is_chunked(&self) -> bool {
        self.chunk.is_some()
    }
}
