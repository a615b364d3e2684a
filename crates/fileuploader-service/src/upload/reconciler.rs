//! Reconciliation of uploads against the client's current file list.

use std::path::Path;

use fileuploader_core::types::file::FileRecord;
use fileuploader_core::types::list::{ListEntry, ListInputState, list_key};

/// Tracks which list entries newly uploaded files have claimed.
///
/// Without list state every file is expected. With list state a file is
/// expected only while an unclaimed `0:/<original name>` entry remains.
#[derive(Debug, Clone, Default)]
pub struct ListReconciler {
    remaining: Option<ListInputState>,
}

impl ListReconciler {
    /// Start reconciling against `list`.
    pub fn new(list: Option<ListInputState>) -> Self {
        Self { remaining: list }
    }

    /// Whether a file with this original name is expected by the client.
    pub fn expects(&self, original_name: &str) -> bool {
        self.remaining
            .as_ref()
            .is_none_or(|list| list.contains(&list_key(original_name)))
    }

    /// Consume the client's entry for a file, returning its editor and
    /// index data.
    pub fn claim(&mut self, original_name: &str) -> Option<ListEntry> {
        self.remaining.as_mut()?.take(&list_key(original_name))
    }
}

/// The client's entry for a known file.
///
/// Looks up the file's path first, then the `0:/<name>` key under which the
/// client lists files by name. The name falls back to the last component
/// of the path when the record carries none.
fn known_entry<'a>(list: &'a ListInputState, file: &FileRecord) -> Option<&'a ListEntry> {
    list.entry(&file.file).or_else(|| {
        let name = if file.name.is_empty() {
            Path::new(&file.file).file_name()?.to_str()?
        } else {
            file.name.as_str()
        };
        list.entry(&list_key(name))
    })
}

/// Extract known files the client no longer lists.
///
/// A known file stays when its `key` attribute or its `0:/<name>` key is
/// listed, or when it was uploaded in this request. Remaining files keep
/// their order. Nothing is removed without list state.
pub fn removed_files(
    list: Option<&ListInputState>,
    known: &mut Vec<FileRecord>,
    key: &str,
) -> Vec<FileRecord> {
    let Some(list) = list else {
        return Vec::new();
    };

    let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(known).into_iter().partition(|file| {
        let listed = file
            .attribute(key)
            .is_some_and(|value| list.contains(&value))
            || known_entry(list, file).is_some();
        !listed && !file.uploaded
    });
    *known = kept;

    if !removed.is_empty() {
        tracing::debug!(count = removed.len(), "Known files removed by client");
    }
    removed
}

/// Copy editor parameters and sort indices from list entries onto the known
/// files they name, by path or by `0:/<name>` key.
pub fn merge_known(list: &ListInputState, known: &mut [FileRecord]) {
    for file in known.iter_mut() {
        let Some(entry) = known_entry(list, file) else {
            continue;
        };
        if entry.editor.is_some() {
            file.editor = entry.editor;
        }
        if entry.index.is_some() {
            file.index = entry.index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileuploader_core::types::editor::EditorParams;

    fn known(path: &str) -> FileRecord {
        FileRecord {
            file: path.into(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            ..FileRecord::default()
        }
    }

    #[test]
    fn test_removed_files_by_path() {
        let list = ListInputState::parse(r#"[{"file":"u/b.png"}]"#).unwrap();
        let mut files = vec![known("u/a.png"), known("u/b.png")];

        let removed = removed_files(Some(&list), &mut files, "file");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].file, "u/a.png");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file, "u/b.png");
    }

    #[test]
    fn test_removed_files_by_name_key() {
        let list = ListInputState::parse(r#"[{"file":"0:/b.png"}]"#).unwrap();
        let mut files = vec![known("u/a.png"), known("u/b.png")];

        let removed = removed_files(Some(&list), &mut files, "file");

        let removed: Vec<_> = removed.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(removed, vec!["u/a.png"]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file, "u/b.png");
    }

    #[test]
    fn test_name_key_falls_back_to_path_component() {
        let list = ListInputState::parse(r#"[{"file":"0:/b.png","index":3}]"#).unwrap();
        let nameless = FileRecord {
            file: "u/b.png".into(),
            ..FileRecord::default()
        };
        let mut files = vec![nameless];

        merge_known(&list, &mut files);
        assert_eq!(files[0].index, Some(3));
        assert!(removed_files(Some(&list), &mut files, "file").is_empty());
    }

    #[test]
    fn test_uploaded_files_never_removed() {
        let list = ListInputState::parse("[]").unwrap();
        let mut fresh = known("u/new.png");
        fresh.uploaded = true;
        let mut files = vec![known("u/old.png"), fresh];

        let removed = removed_files(Some(&list), &mut files, "file");
        assert_eq!(removed[0].file, "u/old.png");
        assert_eq!(files[0].file, "u/new.png");
    }

    #[test]
    fn test_removed_files_custom_key() {
        let list = ListInputState::parse(r#"[{"file":"42"}]"#).unwrap();
        let mut keep = known("u/a.png");
        keep.data = Some(serde_json::json!({"id": 42}));
        let mut drop = known("u/b.png");
        drop.data = Some(serde_json::json!({"id": 7}));
        let mut files = vec![keep, drop];

        let removed = removed_files(Some(&list), &mut files, "id");
        assert_eq!(removed[0].file, "u/b.png");
        assert_eq!(files[0].file, "u/a.png");
    }

    #[test]
    fn test_no_list_removes_nothing() {
        let mut files = vec![known("u/a.png")];
        assert!(removed_files(None, &mut files, "file").is_empty());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_reconciler_expectations() {
        let mut unrestricted = ListReconciler::new(None);
        assert!(unrestricted.expects("anything.txt"));
        assert!(unrestricted.claim("anything.txt").is_none());

        let list = ListInputState::parse(
            r#"[{"file":"0:/a.png","index":2,"editor":{"rotation":180}}]"#,
        )
        .unwrap();
        let mut reconciler = ListReconciler::new(Some(list));
        assert!(reconciler.expects("a.png"));
        assert!(!reconciler.expects("b.png"));

        let entry = reconciler.claim("a.png").unwrap();
        assert_eq!(entry.index, Some(2));
        assert_eq!(entry.editor.map(|e| e.rotation), Some(180));
        assert!(!reconciler.expects("a.png"));
    }

    #[test]
    fn test_merge_known() {
        let list = ListInputState::parse(
            r#"[{"file":"u/b.png","index":0},{"file":"u/a.png","index":1,"editor":{"rotation":90}}]"#,
        )
        .unwrap();
        let mut files = vec![known("u/a.png"), known("u/b.png"), known("u/c.png")];

        merge_known(&list, &mut files);

        assert_eq!(files[0].index, Some(1));
        assert_eq!(
            files[0].editor,
            Some(EditorParams {
                rotation: 90,
                crop: None
            })
        );
        assert_eq!(files[1].index, Some(0));
        assert_eq!(files[2].index, None);
    }
}
