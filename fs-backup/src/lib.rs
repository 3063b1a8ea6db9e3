use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use data_error::{QpatchError, Result};

/// Current UTC time in the suffix format used for backup artifacts,
/// i.e. an ISO timestamp with `:` and `.` replaced by `-`.
pub fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// Sibling path for a backup of `path` taken at `stamp`:
/// `storage.json` becomes `storage.json.bak.<stamp>`.
pub fn backup_path(path: &Path, stamp: &str) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or("backup target has no file name")?;
    let mut backup = name.to_os_string();
    backup.push(format!(".bak.{stamp}"));
    Ok(path.with_file_name(backup))
}

/// Copy `path` byte-for-byte to a timestamped sibling and return the
/// backup path. Must run before the first mutating write to `path`;
/// a missing source is an error, the caller should have aborted earlier.
///
/// Backups are never cleaned up. They are the manual escape hatch.
pub fn scoped_backup(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(QpatchError::source_not_found(path));
    }

    let backup = backup_path(path, &timestamp())?;
    fs::copy(path, &backup)?;
    log::debug!("backed up {} to {}", path.display(), backup.display());

    Ok(backup)
}
