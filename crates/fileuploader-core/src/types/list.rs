//! The client's current file list.

use serde::{Deserialize, Serialize};

/// Slot prefix used when keying newly uploaded files.
pub const LIST_SLOT: u32 = 0;

/// Key under which the client lists a file it has just submitted.
pub fn list_key(original_name: &str) -> String {
    format!("{LIST_SLOT}:/{original_name}")
}

/// One entry of the client's file list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListEntry {
    /// File identifier: a known file's path or a `0:/name` key.
    #[serde(default)]
    pub file: String,
    /// Image edits requested for the file.
    #[serde(default)]
    pub editor: Option<super::editor::EditorParams>,
    /// Position of the file in the client's list.
    #[serde(default)]
    pub index: Option<i64>,
}

/// Parsed list state posted by the client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListInputState {
    entries: Vec<ListEntry>,
}

impl ListInputState {
    /// Create a list from entries in client order.
    pub fn new(entries: Vec<ListEntry>) -> Self {
        Self { entries }
    }

    /// Parse the JSON array posted by the client.
    ///
    /// Returns `None` for malformed input; entries without an identifier
    /// are dropped.
    pub fn parse(raw: &str) -> Option<Self> {
        let entries: Vec<ListEntry> = serde_json::from_str(raw).ok()?;
        Some(Self::new(
            entries.into_iter().filter(|e| !e.file.is_empty()).collect(),
        ))
    }

    /// Identifiers in client order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.file.as_str())
    }

    /// All entries in client order.
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// Whether `key` is listed.
    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// First entry for `key`.
    pub fn entry(&self, key: &str) -> Option<&ListEntry> {
        self.entries.iter().find(|e| e.file == key)
    }

    /// Remove and return the first entry for `key`.
    pub fn take(&mut self, key: &str) -> Option<ListEntry> {
        let position = self.entries.iter().position(|e| e.file == key)?;
        Some(self.entries.remove(position))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
