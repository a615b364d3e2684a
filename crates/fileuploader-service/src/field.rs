//! Normalized file input of one form field.

use fileuploader_core::types::request::{RawFile, RequestContext};

/// The files submitted under one field name, always as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadField {
    /// Field name.
    pub name: String,
    /// Submitted files with a non-empty name.
    pub files: Vec<RawFile>,
}

impl UploadField {
    /// Read `name` from the request. Returns `None` when the field was not
    /// submitted at all.
    pub fn from_request(name: &str, context: &RequestContext) -> Option<Self> {
        let input = context.files.get(name)?.clone();
        let files = input
            .into_files()
            .into_iter()
            .filter(|f| !f.name.is_empty())
            .collect();
        Some(Self {
            name: name.to_string(),
            files,
        })
    }

    /// Number of files.
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Sum of declared sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
