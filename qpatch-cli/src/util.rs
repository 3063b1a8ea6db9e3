use std::fs;
use std::io;
use std::path::Path;

use crate::oplog::OpLog;
use crate::paths::PathSet;

use fs_kvdb::PatchReport;

// Key names Qoder uses for cached authentication state.
pub const SIGN_UP_TYPE_KEY: &str = "qoderAuth/cachedSignUpType";
pub const CACHED_EMAIL_KEY: &str = "qoderAuth/cachedEmail";
pub const ACCESS_TOKEN_KEY: &str = "qoderAuth/accessToken";
pub const REFRESH_TOKEN_KEY: &str = "qoderAuth/refreshToken";
pub const SIGN_UP_TYPE: &str = "Auth_0";

pub fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Look a key up in the document first, then fall back to the
/// key-value store, mirroring where Qoder itself reads from.
pub fn lookup_value(paths: &PathSet, key: &str) -> Option<String> {
    let doc = data_json::load_document(&paths.storage_json);
    if let Some(value) = doc.get(key).and_then(|value| value.as_str()) {
        return Some(value.to_string());
    }
    fs_kvdb::read_value(&paths.state_db, key)
}

pub fn log_patch_report(log: &mut OpLog, report: &PatchReport) {
    for key in &report.updated {
        log.ok(format!("  {key}: updated"));
    }
    for key in &report.inserted {
        log.ok(format!("  {key}: inserted"));
    }
    for (key, err) in &report.failed {
        log.warn(format!("  {key}: {err}"));
    }
}

#[cfg(unix)]
pub fn set_readonly(path: &Path, readonly: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = if readonly { 0o444 } else { 0o644 };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_readonly(path: &Path, readonly: bool) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(readonly);
    fs::set_permissions(path, perms)
}
