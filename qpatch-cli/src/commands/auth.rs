use std::fs;

use serde_json::{json, Value};

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};
use crate::util;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "auth", about = "Write account credentials into Qoder's stores")]
pub struct Auth {
    #[clap(long, help = "Cached account email")]
    email: Option<String>,

    #[clap(long, help = "Access token")]
    access_token: Option<String>,

    #[clap(long, help = "Refresh token")]
    refresh_token: Option<String>,
}

impl Auth {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let patch = CredentialPatch {
            email: self.email.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            machine_id: None,
            dev_device_id: None,
        };
        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            update_auth(&ctx.paths, &patch, log)
        });
        super::finish(report)
    }
}

/// The credential fields an operation wants to push into Qoder's
/// stores. Absent fields are left alone.
#[derive(Clone, Debug, Default)]
pub struct CredentialPatch {
    pub email: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub machine_id: Option<String>,
    pub dev_device_id: Option<String>,
}

pub fn update_auth(
    paths: &PathSet,
    patch: &CredentialPatch,
    log: &mut OpLog,
) -> Result<(), AppError> {
    log.info("Updating authentication...");
    apply_credentials(paths, patch, log)?;
    log.ok("Authentication updated successfully");
    Ok(())
}

/// Push a credential patch into the document, the key-value store and
/// the machine id file. Shared by `auth` and `profile switch`.
pub fn apply_credentials(
    paths: &PathSet,
    patch: &CredentialPatch,
    log: &mut OpLog,
) -> Result<(), AppError> {
    let mut fields: Vec<(String, Value)> =
        vec![(util::SIGN_UP_TYPE_KEY.to_string(), json!(util::SIGN_UP_TYPE))];
    let mut push = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            fields.push((key.to_string(), json!(value)));
        }
    };
    push(util::CACHED_EMAIL_KEY, &patch.email);
    push(util::ACCESS_TOKEN_KEY, &patch.access_token);
    push(util::REFRESH_TOKEN_KEY, &patch.refresh_token);
    push(dev_ident::MACHINE_ID_KEY, &patch.machine_id);
    push(dev_ident::DEV_DEVICE_ID_KEY, &patch.dev_device_id);

    if paths.storage_json.exists() {
        let backup = fs_backup::scoped_backup(&paths.storage_json)?;
        log.info(format!("Backup created: {}", backup.display()));
    }
    data_json::apply_fields(&paths.storage_json, fields.clone())?;
    log.ok("storage.json updated");

    if paths.state_db.exists() {
        log.info("Updating SQLite database...");
        fs_backup::scoped_backup(&paths.state_db)?;

        let entries: Vec<(String, String)> = fields
            .iter()
            .map(|(key, value)| {
                (key.clone(), value.as_str().unwrap_or_default().to_string())
            })
            .collect();
        match fs_kvdb::upsert(&paths.state_db, &entries) {
            Ok(report) => {
                util::log_patch_report(log, &report);
                log.ok("SQLite database updated");
            }
            Err(err) => log.warn(format!("SQLite not available: {err}")),
        }
    }

    if let Some(machine_id) = &patch.machine_id {
        if paths.machine_id_file.exists() {
            fs::write(&paths.machine_id_file, machine_id)?;
            log.ok("Machine ID file updated");
        }
    }

    Ok(())
}
