use std::fs;
use std::path::Path;

use fs_extra::dir::CopyOptions;

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};
use crate::util;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "relocate", about = "Move the Qoder install to its per-user location")]
pub struct Relocate {}

impl Relocate {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            relocate(&ctx.paths, log)
        });
        super::finish(report)
    }
}

/// Qoder misbehaves when installed in a system-wide location; move it
/// under the user's own directory. An install already at the target is
/// success, no install anywhere is a failure.
pub fn relocate(paths: &PathSet, log: &mut OpLog) -> Result<(), AppError> {
    log.info("Starting Qoder location fix...");

    let source = paths
        .relocate_sources
        .iter()
        .find(|candidate| candidate.exists());

    let Some(source) = source else {
        if paths.relocate_target.exists() {
            log.ok(format!(
                "Qoder is already in the correct location: {}",
                paths.relocate_target.display()
            ));
            return Ok(());
        }
        log.info("Qoder installation not found in expected locations");
        return Err(AppError::InstallNotFound);
    };

    log.info(format!("Found Qoder at: {}", source.display()));
    log.info(format!(
        "Target location: {}",
        paths.relocate_target.display()
    ));

    if paths.relocate_target.exists() {
        log.warn(format!(
            "Target location already exists: {}",
            paths.relocate_target.display()
        ));
        log.info("Removing existing target...");
        fs::remove_dir_all(&paths.relocate_target)?;
    }
    util::ensure_parent(&paths.relocate_target)?;

    log.info("Moving Qoder folder...");
    log.info("This may take a few moments...");
    move_tree(source, &paths.relocate_target)?;

    log.ok("Qoder folder moved successfully");
    log.ok("Location fix completed");
    Ok(())
}

fn move_tree(source: &Path, target: &Path) -> Result<(), AppError> {
    // rename is enough on the same filesystem
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.copy_inside = true;
    fs_extra::dir::move_dir(source, target, &options)
        .map_err(|err| AppError::FileOperationError(err.to_string()))?;
    Ok(())
}
