//! Upload results returned to callers.

use serde::{Deserialize, Serialize};

use super::chunk::ChunkAck;
use super::file::FileRecord;
use super::warning::UploadWarning;

/// Outcome of processing one field's submission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Whether the submission was accepted.
    pub is_success: bool,
    /// Whether any warning was produced.
    pub has_warnings: bool,
    /// Human readable warnings.
    pub warnings: Vec<String>,
    /// Files accepted in this request.
    pub files: Vec<FileRecord>,
}

impl UploadResult {
    /// Append a warning.
    pub fn warn(&mut self, warning: &UploadWarning) {
        self.has_warnings = true;
        self.warnings.push(warning.to_string());
    }

    /// Mark the whole submission as rejected with a single warning.
    pub fn reject(&mut self, warning: &UploadWarning) {
        self.is_success = false;
        self.has_warnings = true;
        self.warnings = vec![warning.to_string()];
        self.files.clear();
    }
}

/// What the pipeline produced for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    /// The request was fully processed.
    Completed(UploadResult),
    /// A chunk was stored and the session awaits more chunks.
    ChunkPending(ChunkAck),
}

impl UploadOutcome {
    /// The result, if the request completed.
    pub fn into_result(self) -> Option<UploadResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::ChunkPending(_) => None,
        }
    }

    /// The chunk token, if a session is pending.
    pub fn chunk_token(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::ChunkPending(ack) => Some(ack.token()),
        }
    }
}
