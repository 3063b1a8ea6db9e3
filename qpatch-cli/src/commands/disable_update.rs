use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};
use crate::util;

const UPDATE_YML_STUB: &[u8] = b"# Auto-update disabled\nversion: 0.0.0\n";
const BLOCKING_FILE_BODY: &[u8] = b"# Auto-update disabled by qpatch\n";

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "disable-update", about = "Disable Qoder's auto-update mechanism")]
pub struct DisableUpdate {}

impl DisableUpdate {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            disable_update(&ctx.paths, log)
        });
        super::finish(report)
    }
}

/// Three independent best-effort steps: drop the updater cache,
/// neutralize `app-update.yml`, plant a read-only file where the
/// updater directory used to be. Any of them failing is a warning,
/// never an abort.
pub fn disable_update(paths: &PathSet, log: &mut OpLog) -> Result<(), AppError> {
    log.info("Disabling Qoder auto-update...");

    if paths.updater_dir.exists() {
        log.info(format!(
            "Removing updater directory: {}",
            paths.updater_dir.display()
        ));
        let removed = if paths.updater_dir.is_dir() {
            fs::remove_dir_all(&paths.updater_dir)
        } else {
            fs::remove_file(&paths.updater_dir)
        };
        match removed {
            Ok(()) => log.ok("Removed updater directory"),
            Err(err) => {
                log.warn(format!("Could not remove updater directory: {err}"))
            }
        }
    } else {
        log.info(format!(
            "Updater directory does not exist: {}",
            paths.updater_dir.display()
        ));
    }

    if paths.update_yml.exists() {
        log.info(format!(
            "Modifying update config: {}",
            paths.update_yml.display()
        ));
        match neutralize_update_config(&paths.update_yml) {
            Ok(()) => log.ok("Update config file cleared and locked"),
            Err(err) => {
                log.warn(format!("Could not modify update config file: {err}"))
            }
        }
    } else {
        log.info(format!(
            "Update config file does not exist: {}",
            paths.update_yml.display()
        ));
    }

    log.info(format!(
        "Creating blocking file: {}",
        paths.updater_dir.display()
    ));
    match plant_blocking_file(&paths.updater_dir) {
        Ok(()) => log.ok("Created blocking file"),
        Err(err) => log.warn(format!("Could not create blocking file: {err}")),
    }

    log.ok("Auto-update disabled");
    Ok(())
}

fn neutralize_update_config(path: &Path) -> Result<(), AppError> {
    // A previous run may have locked it.
    util::set_readonly(path, false)?;
    fs_backup::scoped_backup(path)?;
    fs::write(path, UPDATE_YML_STUB)?;
    util::set_readonly(path, true)?;
    Ok(())
}

/// A read-only regular file at the updater's path keeps the updater
/// from recreating its directory.
fn plant_blocking_file(path: &Path) -> Result<(), AppError> {
    util::ensure_parent(path)?;
    fs::write(path, BLOCKING_FILE_BODY)?;
    util::set_readonly(path, true)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::testing::path_set;
    use tempdir::TempDir;

    #[test]
    fn test_disable_update_full_pass() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        fs::create_dir_all(&paths.updater_dir).unwrap();
        fs::write(paths.updater_dir.join("pending.zip"), b"update").unwrap();
        util::ensure_parent(&paths.update_yml).unwrap();
        fs::write(&paths.update_yml, b"version: 1.2.3\n").unwrap();

        let mut log = OpLog::silent();
        disable_update(&paths, &mut log).unwrap();

        // updater dir replaced by a read-only blocking file
        assert!(paths.updater_dir.is_file());
        assert!(fs::metadata(&paths.updater_dir)
            .unwrap()
            .permissions()
            .readonly());

        // update config stubbed out and backed up
        let yml = fs::read(&paths.update_yml).unwrap();
        assert_eq!(yml, UPDATE_YML_STUB);
        let backups: Vec<_> = fs::read_dir(paths.update_yml.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with("app-update.yml.bak."))
            .collect();
        assert_eq!(backups.len(), 1);

        assert!(log
            .lines()
            .iter()
            .any(|line| line == "[OK] Auto-update disabled"));
    }

    #[test]
    fn test_disable_update_with_nothing_present_still_succeeds() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        let mut log = OpLog::silent();
        disable_update(&paths, &mut log).unwrap();

        // the blocking file gets planted regardless
        assert!(paths.updater_dir.is_file());
    }
}
