use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use data_error::Result;

pub const CONFIG_FILE: &str = "config.json";

/// The tool's own settings, stored next to the profile store under the
/// user's documents directory. Missing or unreadable content falls
/// back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolConfig {
    /// Qoder install root, when it lives somewhere non-standard.
    pub install_dir: Option<PathBuf>,
    /// Replacement script used by `restore-workbench`.
    pub workbench_source: Option<PathBuf>,
}

impl ToolConfig {
    pub fn load(config_dir: &Path) -> Self {
        match fs::read_to_string(config_dir.join(CONFIG_FILE)) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs_atomic::write_atomic(config_dir.join(CONFIG_FILE), json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");

        let config = ToolConfig {
            install_dir: Some(PathBuf::from("/custom/qoder")),
            workbench_source: None,
        };
        config.save(temp_dir.path()).unwrap();

        assert_eq!(ToolConfig::load(temp_dir.path()), config);
    }

    #[test]
    fn test_missing_or_broken_config_is_default() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");

        assert_eq!(ToolConfig::load(temp_dir.path()), ToolConfig::default());

        fs::write(temp_dir.path().join(CONFIG_FILE), b"{oops").unwrap();
        assert_eq!(ToolConfig::load(temp_dir.path()), ToolConfig::default());
    }
}
