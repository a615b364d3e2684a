//! Ordering of files by client-side index.

use fileuploader_core::types::file::FileRecord;

/// Sort files by `index`.
///
/// Files without an index first receive increasing indices starting at the
/// number of files, in their current order; the sort is then stable. Lists
/// where no file carries an index are left untouched.
pub fn sort_by_index(files: &mut Vec<FileRecord>) {
    if files.iter().all(|f| f.index.is_none()) {
        return;
    }

    let mut next = files.len() as i64;
    for file in files.iter_mut().filter(|f| f.index.is_none()) {
        file.index = Some(next);
        next += 1;
    }
    files.sort_by_key(|f| f.index);
}
