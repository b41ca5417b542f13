//! Whole-file persistence shared by the credential and cookie stores.

use std::io::Write;
use std::path::Path;

use crate::api::StorageError;

/// Replace `path` with `contents` in one step.
///
/// The containing directory is created if missing. Data is written to a
/// temp file in the same directory and renamed over the target, so readers
/// see either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut temp_file =
        tempfile::NamedTempFile::new_in(parent).map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .write_all(contents.as_bytes())
        .map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file.persist(path).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
