use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use data_error::{QpatchError, Result};
use dev_ident::IdentitySet;

/// One saved credential bundle, serialized exactly as the
/// `accounts.json` array entries: camelCase fields, optional fields
/// omitted when absent. `machineId`/`devDeviceId` are the identifier
/// snapshot assigned when the profile was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_device_id: Option<String>,
    pub created_at: String,
}

/// User-supplied fields of a profile about to be created.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// An ordered collection of profiles persisted as one JSON array file.
/// Every write replaces the file wholesale; a missing file reads as an
/// empty collection.
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All profiles in stored order. Missing file is an empty list.
    pub fn list(&self) -> Result<Vec<Profile>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let profiles = serde_json::from_str(&text)?;
        Ok(profiles)
    }

    /// Append a new profile: assigns a fresh uuid id, a creation
    /// timestamp and an identifier snapshot, then rewrites the file.
    pub fn append(&self, draft: ProfileDraft) -> Result<Profile> {
        let mut profiles = self.list()?;

        let ids = IdentitySet::generate();
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            email: draft.email,
            access_token: draft.access_token,
            refresh_token: draft.refresh_token,
            machine_id: Some(ids.machine_id),
            dev_device_id: Some(ids.dev_device_id),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        profiles.push(profile.clone());
        self.save(&profiles)?;

        Ok(profile)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Profile>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|profile| profile.id == id))
    }

    /// Remove a profile; returns false when no profile had that id.
    pub fn remove_by_id(&self, id: &str) -> Result<bool> {
        let mut profiles = self.list()?;
        let before = profiles.len();
        profiles.retain(|profile| profile.id != id);

        if profiles.len() == before {
            return Ok(false);
        }

        self.save(&profiles)?;
        Ok(true)
    }

    /// Merge profiles from another array file. Entries whose id is
    /// already present are skipped, so ids stay unique. Returns the
    /// number of profiles actually added.
    pub fn import(&self, source: impl AsRef<Path>) -> Result<usize> {
        let source = source.as_ref();
        if !source.exists() {
            return Err(QpatchError::source_not_found(source));
        }

        let text = fs::read_to_string(source)?;
        let incoming: Vec<Profile> = serde_json::from_str(&text)?;

        let mut profiles = self.list()?;
        let mut added = 0;
        for profile in incoming {
            if profiles.iter().any(|known| known.id == profile.id) {
                log::warn!("skipping duplicate profile id {}", profile.id);
                continue;
            }
            profiles.push(profile);
            added += 1;
        }

        if added > 0 {
            self.save(&profiles)?;
        }
        Ok(added)
    }

    /// The raw JSON of the store, suitable for handing to the user.
    pub fn export(&self) -> Result<String> {
        let profiles = self.list()?;
        Ok(serde_json::to_string_pretty(&profiles)?)
    }

    fn save(&self, profiles: &[Profile]) -> Result<()> {
        let json = serde_json::to_string_pretty(profiles)?;
        fs_atomic::write_atomic(&self.path, json.as_bytes())
    }
}
