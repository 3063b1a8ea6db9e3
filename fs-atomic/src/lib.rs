use std::fs;
use std::path::{Path, PathBuf};

use data_error::Result;

/// Replace `dest` with `data` without ever leaving a truncated file
/// behind: the bytes go to a hidden sibling first, then a rename moves
/// them over the destination. Parent directories are created as needed.
pub fn write_atomic(dest: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let dest = dest.as_ref();
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let name = dest
        .file_name()
        .ok_or("destination has no file name")?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp = parent.join(tmp_name);

    fs::write(&tmp, data)?;
    if let Err(err) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    Ok(())
}
