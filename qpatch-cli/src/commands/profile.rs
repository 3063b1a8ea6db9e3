use std::fs;
use std::path::PathBuf;

use crate::commands::auth::{self, CredentialPatch};
use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};

use data_profile::{ProfileDraft, ProfileStore};

#[derive(Debug, clap::Subcommand)]
pub enum Profile {
    List(List),
    Add(Add),
    Remove(Remove),
    Switch(Switch),
    Import(Import),
    Export(Export),
}

impl Profile {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        match self {
            Profile::List(cmd) => cmd.run(ctx),
            Profile::Add(cmd) => cmd.run(ctx),
            Profile::Remove(cmd) => cmd.run(ctx),
            Profile::Switch(cmd) => cmd.run(ctx),
            Profile::Import(cmd) => cmd.run(ctx),
            Profile::Export(cmd) => cmd.run(ctx),
        }
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "list", about = "List saved profiles")]
pub struct List {}

impl List {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let store = ProfileStore::new(&ctx.paths.profiles_file);
        let profiles = store.list()?;

        if profiles.is_empty() {
            println!("No saved profiles ({})", store.path().display());
            return Ok(());
        }

        println!("{: <36} {: <20} {: <28} {}", "id", "name", "email", "created");
        for profile in profiles {
            println!(
                "{: <36} {: <20} {: <28} {}",
                profile.id, profile.name, profile.email, profile.created_at
            );
        }
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "add", about = "Save a new credential profile")]
pub struct Add {
    #[clap(long, help = "Display name")]
    name: String,

    #[clap(long, help = "Account email")]
    email: String,

    #[clap(long, help = "Access token")]
    access_token: String,

    #[clap(long, help = "Refresh token")]
    refresh_token: Option<String>,
}

impl Add {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let store = ProfileStore::new(&ctx.paths.profiles_file);
        let profile = store.append(ProfileDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        })?;

        println!("Saved profile {} ({})", profile.name, profile.id);
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "remove", about = "Delete a saved profile by id")]
pub struct Remove {
    #[clap(help = "Profile id")]
    id: String,
}

impl Remove {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let store = ProfileStore::new(&ctx.paths.profiles_file);
        if !store.remove_by_id(&self.id)? {
            return Err(AppError::ProfileNotFound(self.id.clone()));
        }
        println!("Removed profile {}", self.id);
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "switch", about = "Apply a saved profile's credentials to Qoder")]
pub struct Switch {
    #[clap(help = "Profile id")]
    id: String,
}

impl Switch {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            switch_profile(&ctx.paths, &self.id, log)
        });
        super::finish(report)
    }
}

/// "Switching" copies the profile's credential fields into Qoder's
/// stores; no active-profile marker is kept anywhere.
pub fn switch_profile(
    paths: &PathSet,
    id: &str,
    log: &mut OpLog,
) -> Result<(), AppError> {
    let store = ProfileStore::new(&paths.profiles_file);
    let profile = store
        .find_by_id(id)?
        .ok_or_else(|| AppError::ProfileNotFound(id.to_string()))?;

    log.info(format!("Switching to profile: {}", profile.name));
    log.info("Applying profile credentials to Qoder...");

    let patch = CredentialPatch {
        email: Some(profile.email),
        access_token: Some(profile.access_token),
        refresh_token: profile.refresh_token,
        machine_id: profile.machine_id,
        dev_device_id: profile.dev_device_id,
    };
    auth::apply_credentials(paths, &patch, log)?;

    log.ok("Profile switched successfully");
    log.info("Restart Qoder for the change to take effect");
    Ok(())
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "import", about = "Merge profiles from another accounts file")]
pub struct Import {
    #[clap(value_parser, help = "JSON array file to import")]
    file: PathBuf,
}

impl Import {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let store = ProfileStore::new(&ctx.paths.profiles_file);
        let added = store.import(&self.file)?;
        println!("Imported {added} profile(s)");
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "export", about = "Export all saved profiles as JSON")]
pub struct Export {
    #[clap(long, value_parser, help = "Write to this file instead of stdout")]
    output: Option<PathBuf>,
}

impl Export {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let store = ProfileStore::new(&ctx.paths.profiles_file);
        let json = store.export()?;

        match &self.output {
            Some(path) => {
                fs::write(path, &json)?;
                println!("Exported to {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::testing::path_set;
    use crate::util;
    use serde_json::json;
    use tempdir::TempDir;

    #[test]
    fn test_switch_applies_credentials_and_snapshot() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        util::ensure_parent(&paths.storage_json).unwrap();
        fs::write(&paths.storage_json, "{}").unwrap();

        let store = ProfileStore::new(&paths.profiles_file);
        let profile = store
            .append(ProfileDraft {
                name: "work".to_string(),
                email: "work@example.com".to_string(),
                access_token: "tok-work".to_string(),
                refresh_token: Some("refresh-work".to_string()),
            })
            .unwrap();

        let mut log = OpLog::silent();
        switch_profile(&paths, &profile.id, &mut log).unwrap();

        let doc = data_json::load_document(&paths.storage_json);
        assert_eq!(
            doc.get(util::CACHED_EMAIL_KEY),
            Some(&json!("work@example.com"))
        );
        assert_eq!(doc.get(util::ACCESS_TOKEN_KEY), Some(&json!("tok-work")));
        assert_eq!(
            doc.get(util::REFRESH_TOKEN_KEY),
            Some(&json!("refresh-work"))
        );
        assert_eq!(
            doc.get(dev_ident::MACHINE_ID_KEY),
            Some(&json!(profile.machine_id.unwrap()))
        );
    }

    #[test]
    fn test_switch_unknown_profile_touches_nothing() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let paths = path_set(temp_dir.path());

        let mut log = OpLog::silent();
        let err = switch_profile(&paths, "missing", &mut log).unwrap_err();

        assert!(matches!(err, AppError::ProfileNotFound(_)));
        assert!(!paths.storage_json.exists());
    }
}
