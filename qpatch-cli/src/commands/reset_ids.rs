use std::fs;
use std::process::{Command, Stdio};

use serde_json::Value;

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet, TargetOs};
use crate::util;

use data_error::QpatchError;
use dev_ident::IdentitySet;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "reset-ids", about = "Replace Qoder's telemetry identifiers with a fresh set")]
pub struct ResetIds {}

impl ResetIds {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let (report, _ids) = OpReport::capture(OpLog::echoing(), |log| {
            reset_ids(ctx.os, &ctx.paths, log)
        });
        super::finish(report)
    }
}

/// Rotate all telemetry identifiers: patch `storage.json`, rewrite the
/// machine id file, upsert the same keys into `state.vscdb` when it
/// exists, and refresh the SQM registry value on Windows. Each touched
/// target file is backed up before the first write to it.
pub fn reset_ids(
    os: TargetOs,
    paths: &PathSet,
    log: &mut OpLog,
) -> Result<IdentitySet, AppError> {
    log.info("Starting machine ID reset...");

    if !paths.storage_json.exists() {
        return Err(QpatchError::source_not_found(&paths.storage_json).into());
    }

    let backup = fs_backup::scoped_backup(&paths.storage_json)?;
    log.info(format!("Backup created: {}", backup.display()));

    let ids = IdentitySet::generate();

    log.info("Writing new IDs to storage.json...");
    let fields = ids
        .storage_entries()
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)));
    data_json::apply_fields(&paths.storage_json, fields)?;

    util::ensure_parent(&paths.machine_id_file)?;
    fs::write(&paths.machine_id_file, &ids.dev_device_id)?;
    log.ok("Machine ID file updated");

    if paths.state_db.exists() {
        log.info("Updating SQLite database...");
        fs_backup::scoped_backup(&paths.state_db)?;
        log.info("SQLite backup created");

        let entries: Vec<(String, String)> = ids
            .storage_entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        match fs_kvdb::upsert(&paths.state_db, &entries) {
            Ok(patch) => {
                util::log_patch_report(log, &patch);
                log.ok("SQLite database updated");
            }
            Err(err) => log.warn(format!("SQLite not available: {err}")),
        }
    }

    if os == TargetOs::Windows {
        log.info("Updating Windows registry...");
        update_sqm_registry(log);
    }

    log.blank();
    log.ok("Machine ID reset completed");
    log.blank();
    log.line("New IDs generated:");
    for (key, value) in ids.storage_entries() {
        log.line(format!("  {key}: {value}"));
    }

    Ok(ids)
}

/// Best effort: needs elevation, so a failure is only a warning.
fn update_sqm_registry(log: &mut OpLog) {
    let guid = dev_ident::braced_uuid();
    let status = Command::new("reg")
        .args([
            "add",
            r"HKLM\SOFTWARE\Microsoft\SQMClient",
            "/v",
            "MachineId",
            "/t",
            "REG_SZ",
            "/d",
            &guid,
            "/f",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(code) if code.success() => log.ok("Windows registry updated"),
        _ => log.warn("Could not update registry (may need admin rights)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::testing::path_set;
    use rusqlite::{params, Connection};
    use tempdir::TempDir;

    fn backups_of(path: &std::path::Path) -> Vec<std::path::PathBuf> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|candidate| {
                candidate
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with(&format!("{name}.bak."))
            })
            .collect()
    }

    #[test]
    fn test_reset_rotates_every_identifier() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        util::ensure_parent(&paths.storage_json).unwrap();
        fs::write(
            &paths.storage_json,
            r#"{"telemetry.machineId": "old", "untouched": true}"#,
        )
        .unwrap();

        let conn = Connection::open(&paths.state_db).unwrap();
        conn.execute(
            "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, \
             value BLOB)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
            params!["telemetry.machineId", "old"],
        )
        .unwrap();
        drop(conn);

        let mut log = OpLog::silent();
        let ids = reset_ids(TargetOs::Linux, &paths, &mut log).unwrap();

        let doc = data_json::load_document(&paths.storage_json);
        assert_eq!(
            doc.get("telemetry.machineId").unwrap().as_str().unwrap(),
            ids.machine_id
        );
        assert_eq!(
            doc.get("storage.serviceMachineId")
                .unwrap()
                .as_str()
                .unwrap(),
            ids.dev_device_id
        );
        assert_eq!(doc.get("untouched"), Some(&serde_json::json!(true)));

        assert_eq!(
            fs::read_to_string(&paths.machine_id_file).unwrap(),
            ids.dev_device_id
        );

        assert_eq!(
            fs_kvdb::read_value(&paths.state_db, "telemetry.machineId"),
            Some(ids.machine_id.clone())
        );
        assert_eq!(
            fs_kvdb::read_value(&paths.state_db, "telemetry.sqmId"),
            Some(ids.sqm_id.clone())
        );

        // exactly one backup per touched file
        assert_eq!(backups_of(&paths.storage_json).len(), 1);
        assert_eq!(backups_of(&paths.state_db).len(), 1);

        assert!(log
            .lines()
            .iter()
            .any(|line| line == "[OK] Machine ID reset completed"));
    }

    #[test]
    fn test_reset_without_storage_file_fails_before_writing() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        let mut log = OpLog::silent();
        let err = reset_ids(TargetOs::Linux, &paths, &mut log).unwrap_err();

        assert!(matches!(
            err,
            AppError::QpatchError(QpatchError::SourceNotFound(_))
        ));
        assert!(!paths.machine_id_file.exists());
    }

    #[test]
    fn test_reset_tolerates_a_missing_state_db() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        util::ensure_parent(&paths.storage_json).unwrap();
        fs::write(&paths.storage_json, "{}").unwrap();

        let mut log = OpLog::silent();
        reset_ids(TargetOs::Linux, &paths, &mut log).unwrap();

        assert!(!paths.state_db.exists());
    }
}
