use std::fs;

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};
use crate::util;

use dev_ident::IdentitySet;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "full-reset", about = "Remove all Qoder data and start over with fresh identifiers")]
pub struct FullReset {
    #[clap(long, action = clap::ArgAction::SetTrue, help = "Confirm the destructive reset")]
    yes: bool,
}

impl FullReset {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        if !self.yes {
            return Err(AppError::ConfirmationRequired);
        }

        let (report, _ids) = OpReport::capture(OpLog::echoing(), |log| {
            full_reset(&ctx.paths, log)
        });
        super::finish(report)
    }
}

/// Wipe the per-OS data directories, then seed a fresh `storage.json`
/// holding nothing but a new identifier set, plus the machine id file.
/// Directories that refuse to go are warnings; the reseed must succeed.
pub fn full_reset(
    paths: &PathSet,
    log: &mut OpLog,
) -> Result<IdentitySet, AppError> {
    log.info("Starting complete Qoder reset...");
    log.warn("This will remove all Qoder settings and data");

    for dir in &paths.data_dirs {
        if !dir.exists() {
            continue;
        }
        let removed = if dir.is_dir() {
            fs::remove_dir_all(dir)
        } else {
            fs::remove_file(dir)
        };
        match removed {
            Ok(()) => log.ok(format!("Removed: {}", dir.display())),
            Err(err) => {
                log.warn(format!("Could not remove: {} - {err}", dir.display()))
            }
        }
    }

    log.blank();
    log.info("Resetting machine identifiers...");

    let ids = IdentitySet::generate();
    let mut doc = Map::new();
    for (key, value) in ids.storage_entries() {
        doc.insert(key.to_string(), Value::String(value));
    }
    data_json::write_document(&paths.storage_json, &doc)?;
    log.ok("Created fresh storage.json with new IDs");

    util::ensure_parent(&paths.machine_id_file)?;
    fs::write(&paths.machine_id_file, &ids.dev_device_id)?;
    log.ok("Created fresh machineId file");

    log.blank();
    log.ok("Complete reset finished");
    log.info("Restart the system for full effect");

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::testing::path_set;
    use tempdir::TempDir;

    #[test]
    fn test_full_reset_wipes_and_reseeds() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        util::ensure_parent(&paths.storage_json).unwrap();
        fs::write(&paths.storage_json, r#"{"qoderAuth/accessToken": "tok"}"#)
            .unwrap();
        fs::create_dir_all(&paths.updater_dir).unwrap();

        let mut log = OpLog::silent();
        let ids = full_reset(&paths, &mut log).unwrap();

        assert!(!paths.updater_dir.exists());

        let doc = data_json::load_document(&paths.storage_json);
        // only the five identifier keys survive
        assert_eq!(doc.len(), 5);
        assert!(!doc.contains_key("qoderAuth/accessToken"));
        assert_eq!(
            doc.get("telemetry.devDeviceId").unwrap().as_str().unwrap(),
            ids.dev_device_id
        );

        assert_eq!(
            fs::read_to_string(&paths.machine_id_file).unwrap(),
            ids.dev_device_id
        );
    }
}
