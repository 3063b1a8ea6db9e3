use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::error::AppError;

/*
Qoder scatters its state across three per-OS locations:

  - the user config area (storage.json, state.vscdb, machineId file)
  - the install tree (resources/app, the workbench script, app-update.yml)
  - the updater cache

Resolution is pure: it looks only at the provided environment and an
existence probe, never at the real filesystem, so each OS branch is
testable from anywhere.
*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Macos,
    Linux,
}

impl TargetOs {
    pub fn current() -> Self {
        if cfg!(windows) {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::Macos
        } else {
            TargetOs::Linux
        }
    }
}

/// The environment variables path resolution is allowed to see.
#[derive(Clone, Debug, Default)]
pub struct Env {
    vars: BTreeMap<String, String>,
}

impl Env {
    pub fn from_process() -> Self {
        let mut vars: BTreeMap<String, String> = std::env::vars().collect();
        // HOME can be absent in stripped-down environments.
        if !vars.contains_key("HOME") {
            if let Some(dir) = home::home_dir() {
                vars.insert("HOME".to_string(), dir.display().to_string());
            }
        }
        Self { vars }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            vars: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn require(&self, key: &'static str) -> Result<&str, AppError> {
        self.get(key).ok_or(AppError::MissingEnv(key))
    }
}

/// Every well-known path one resolution produces.
#[derive(Clone, Debug)]
pub struct PathSet {
    pub storage_json: PathBuf,
    pub state_db: PathBuf,
    pub machine_id_file: PathBuf,
    /// `resources/app` inside the install tree.
    pub app_dir: PathBuf,
    pub workbench_js: PathBuf,
    pub updater_dir: PathBuf,
    pub update_yml: PathBuf,
    /// System locations a misplaced install may occupy, probed in order.
    pub relocate_sources: Vec<PathBuf>,
    /// The per-user location the install should live in.
    pub relocate_target: PathBuf,
    /// Everything a full reset removes.
    pub data_dirs: Vec<PathBuf>,
    pub profiles_file: PathBuf,
    pub config_dir: PathBuf,
}

impl PathSet {
    /// Re-aim the install-tree paths at an explicit install root,
    /// e.g. from the tool configuration.
    pub fn point_install_at(&mut self, install_root: &Path) {
        self.app_dir = install_root.join("resources").join("app");
        self.workbench_js = workbench_under(&self.app_dir);
        self.update_yml = install_root.join("resources").join("app-update.yml");
    }
}

fn workbench_under(app_dir: &Path) -> PathBuf {
    app_dir
        .join("out")
        .join("vs")
        .join("workbench")
        .join("workbench.desktop.main.js")
}

/// Resolve all well-known paths for `os` from `env`. `exists` is the
/// only window onto the filesystem, used for the Linux config-dir case
/// fallback and install probing.
pub fn resolve(
    os: TargetOs,
    env: &Env,
    exists: &dyn Fn(&Path) -> bool,
) -> Result<PathSet, AppError> {
    match os {
        TargetOs::Windows => resolve_windows(env),
        TargetOs::Macos => resolve_macos(env),
        TargetOs::Linux => resolve_linux(env, exists),
    }
}

fn resolve_windows(env: &Env) -> Result<PathSet, AppError> {
    let appdata = PathBuf::from(env.require("APPDATA")?);
    let localappdata = PathBuf::from(env.require("LOCALAPPDATA")?);
    let program_files = env
        .get("ProgramFiles")
        .unwrap_or(r"C:\Program Files")
        .to_string();

    let qoder_data = appdata.join("Qoder");
    let global_storage = qoder_data.join("User").join("globalStorage");
    let install_root = localappdata.join("Programs").join("Qoder");
    let app_dir = install_root.join("resources").join("app");
    let updater_dir = localappdata.join("qoder-updater");

    Ok(PathSet {
        storage_json: global_storage.join("storage.json"),
        state_db: global_storage.join("state.vscdb"),
        machine_id_file: qoder_data.join("machineId"),
        workbench_js: workbench_under(&app_dir),
        app_dir,
        updater_dir: updater_dir.clone(),
        update_yml: install_root.join("resources").join("app-update.yml"),
        relocate_sources: vec![PathBuf::from(program_files).join("Qoder")],
        relocate_target: install_root,
        data_dirs: vec![qoder_data, updater_dir],
        profiles_file: documents_dir(env, TargetOs::Windows)?
            .join("QoderFreeVIP")
            .join("accounts.json"),
        config_dir: documents_dir(env, TargetOs::Windows)?.join(".qoder-free-vip"),
    })
}

fn resolve_macos(env: &Env) -> Result<PathSet, AppError> {
    let home = PathBuf::from(env.require("HOME")?);
    let app_support = home.join("Library").join("Application Support");

    let qoder_data = app_support.join("Qoder");
    let global_storage = qoder_data.join("User").join("globalStorage");
    let bundle = PathBuf::from("/Applications/Qoder.app");
    let resources = bundle.join("Contents").join("Resources");
    let app_dir = resources.join("app");
    let updater_dir = app_support.join("qoder-updater");

    Ok(PathSet {
        storage_json: global_storage.join("storage.json"),
        state_db: global_storage.join("state.vscdb"),
        machine_id_file: qoder_data.join("machineId"),
        workbench_js: workbench_under(&app_dir),
        app_dir,
        updater_dir: updater_dir.clone(),
        update_yml: resources.join("app-update.yml"),
        relocate_sources: vec![bundle],
        relocate_target: home.join("Applications").join("Qoder.app"),
        data_dirs: vec![
            qoder_data,
            updater_dir,
            home.join("Library")
                .join("Preferences")
                .join("com.qoder.Qoder.plist"),
            home.join("Library").join("Caches").join("com.qoder.Qoder"),
        ],
        profiles_file: documents_dir(env, TargetOs::Macos)?
            .join("QoderFreeVIP")
            .join("accounts.json"),
        config_dir: documents_dir(env, TargetOs::Macos)?.join(".qoder-free-vip"),
    })
}

fn resolve_linux(
    env: &Env,
    exists: &dyn Fn(&Path) -> bool,
) -> Result<PathSet, AppError> {
    let home = PathBuf::from(env.require("HOME")?);
    let config = home.join(".config");

    // Packagers disagree on the directory case.
    let qoder_dir = if exists(&config.join("Qoder")) {
        "Qoder"
    } else {
        "qoder"
    };
    let qoder_data = config.join(qoder_dir);
    let global_storage = qoder_data.join("User").join("globalStorage");

    let opt_app = PathBuf::from("/opt/Qoder/resources/app");
    let app_dir = if exists(&opt_app) {
        opt_app
    } else {
        PathBuf::from("/usr/share/qoder/resources/app")
    };
    let updater_dir = config.join("qoder-updater");

    Ok(PathSet {
        storage_json: global_storage.join("storage.json"),
        state_db: global_storage.join("state.vscdb"),
        machine_id_file: qoder_data.join("machineid"),
        workbench_js: workbench_under(&app_dir),
        app_dir,
        updater_dir: updater_dir.clone(),
        update_yml: config.join("qoder").join("resources").join("app-update.yml"),
        relocate_sources: vec![
            PathBuf::from("/opt/Qoder"),
            PathBuf::from("/usr/share/qoder"),
            PathBuf::from("/usr/local/share/qoder"),
        ],
        relocate_target: home.join(".local").join("share").join("Qoder"),
        data_dirs: vec![config.join("Qoder"), config.join("qoder"), updater_dir],
        profiles_file: documents_dir(env, TargetOs::Linux)?
            .join("QoderFreeVIP")
            .join("accounts.json"),
        config_dir: documents_dir(env, TargetOs::Linux)?.join(".qoder-free-vip"),
    })
}

fn documents_dir(env: &Env, os: TargetOs) -> Result<PathBuf, AppError> {
    match os {
        TargetOs::Windows => {
            Ok(PathBuf::from(env.require("USERPROFILE")?).join("Documents"))
        }
        TargetOs::Macos => Ok(PathBuf::from(env.require("HOME")?).join("Documents")),
        TargetOs::Linux => match env.get("XDG_DOCUMENTS_DIR") {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(PathBuf::from(env.require("HOME")?).join("Documents")),
        },
    }
}

/// Process-scoped context every operation receives: detected OS,
/// resolved paths (with config overrides applied) and the tool config.
/// Built once in `main`, passed down explicitly.
pub struct PatchContext {
    pub os: TargetOs,
    pub paths: PathSet,
    pub config: ToolConfig,
}

impl PatchContext {
    pub fn from_process() -> Result<Self, AppError> {
        let os = TargetOs::current();
        let env = Env::from_process();
        let mut paths = resolve(os, &env, &|path: &Path| path.exists())?;

        let config = ToolConfig::load(&paths.config_dir);
        if let Some(install) = &config.install_dir {
            log::debug!("install override from config: {}", install.display());
            paths.point_install_at(install);
        }

        Ok(Self { os, paths, config })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A fully self-contained path set under one scratch root.
    pub fn path_set(root: &Path) -> PathSet {
        let qoder_data = root.join("Qoder");
        let global_storage = qoder_data.join("User").join("globalStorage");
        let install = root.join("install");
        let app_dir = install.join("resources").join("app");
        let updater_dir = root.join("qoder-updater");

        PathSet {
            storage_json: global_storage.join("storage.json"),
            state_db: global_storage.join("state.vscdb"),
            machine_id_file: qoder_data.join("machineId"),
            workbench_js: workbench_under(&app_dir),
            app_dir,
            updater_dir: updater_dir.clone(),
            update_yml: install.join("resources").join("app-update.yml"),
            relocate_sources: vec![root.join("system").join("Qoder")],
            relocate_target: root.join("user").join("Qoder"),
            data_dirs: vec![qoder_data, updater_dir],
            profiles_file: root
                .join("Documents")
                .join("QoderFreeVIP")
                .join("accounts.json"),
            config_dir: root.join("Documents").join(".qoder-free-vip"),
        }
    }
}
