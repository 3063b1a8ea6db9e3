use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};
use crate::util;

use data_error::QpatchError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "restore-workbench", about = "Copy a known-good workbench script into the install tree")]
pub struct RestoreWorkbench {
    #[clap(long, value_parser, help = "Replacement workbench.desktop.main.js")]
    source: Option<PathBuf>,
}

impl RestoreWorkbench {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let source = self
            .source
            .clone()
            .or_else(|| ctx.config.workbench_source.clone())
            .or_else(default_source);
        let Some(source) = source else {
            return Err(AppError::OperationFailed(
                "no replacement workbench configured; pass --source".to_string(),
            ));
        };

        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            restore_workbench(&ctx.paths, &source, log)
        });
        super::finish(report)
    }
}

/// `resources/fixes/` next to the executable, the place release
/// archives ship the pristine script in.
fn default_source() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(
        exe.parent()?
            .join("resources")
            .join("fixes")
            .join("workbench.desktop.main.js"),
    )
}

pub fn restore_workbench(
    paths: &PathSet,
    source: &Path,
    log: &mut OpLog,
) -> Result<(), AppError> {
    log.info("Starting workbench file fix...");

    if !source.exists() {
        log.info("Place the replacement script under resources/fixes or pass --source");
        return Err(QpatchError::source_not_found(source).into());
    }

    log.info(format!("Source file found: {}", source.display()));
    log.info(format!("Target path: {}", paths.workbench_js.display()));

    util::ensure_parent(&paths.workbench_js)?;
    if paths.workbench_js.exists() {
        log.info("File exists, overwriting...");
        let backup = fs_backup::scoped_backup(&paths.workbench_js)?;
        log.info(format!("Backup created: {}", backup.display()));
    }

    log.info("Copying file...");
    fs::copy(source, &paths.workbench_js)?;

    log.ok("File copied successfully");
    log.ok("Workbench file fix completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::testing::path_set;
    use tempdir::TempDir;

    #[test]
    fn test_restore_copies_and_backs_up_the_old_script() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        let source = temp_dir.path().join("pristine.js");
        fs::write(&source, b"pristine").unwrap();
        util::ensure_parent(&paths.workbench_js).unwrap();
        fs::write(&paths.workbench_js, b"patched").unwrap();

        let mut log = OpLog::silent();
        restore_workbench(&paths, &source, &mut log).unwrap();

        assert_eq!(fs::read(&paths.workbench_js).unwrap(), b"pristine");

        let backup = fs::read_dir(paths.workbench_js.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .find(|path| {
                path.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .contains(".bak.")
            })
            .expect("backup file missing");
        assert_eq!(fs::read(backup).unwrap(), b"patched");
    }

    #[test]
    fn test_restore_without_source_fails() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        let mut log = OpLog::silent();
        let missing = temp_dir.path().join("absent.js");
        let err = restore_workbench(&paths, &missing, &mut log).unwrap_err();
        assert!(matches!(
            err,
            AppError::QpatchError(QpatchError::SourceNotFound(_))
        ));
    }
}
