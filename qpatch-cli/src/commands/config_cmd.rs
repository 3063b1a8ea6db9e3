use std::path::PathBuf;

use crate::config::{ToolConfig, CONFIG_FILE};
use crate::error::AppError;
use crate::paths::PatchContext;

#[derive(Debug, clap::Subcommand)]
pub enum Config {
    #[clap(about = "Print the tool configuration")]
    Show,
    #[clap(about = "Set a configuration value")]
    Set(Set),
    #[clap(about = "Clear a configuration value")]
    Unset(Unset),
}

#[derive(Clone, Debug, clap::Args)]
pub struct Set {
    #[clap(value_enum, help = "Configuration key")]
    key: ConfigKey,

    #[clap(value_parser, help = "Path value")]
    value: PathBuf,
}

#[derive(Clone, Debug, clap::Args)]
pub struct Unset {
    #[clap(value_enum, help = "Configuration key")]
    key: ConfigKey,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ConfigKey {
    /// Qoder install root override
    InstallDir,
    /// Replacement workbench script for restore-workbench
    WorkbenchSource,
}

impl Config {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        match self {
            Config::Show => {
                println!(
                    "{}",
                    ctx.paths.config_dir.join(CONFIG_FILE).display()
                );
                println!("{}", serde_json::to_string_pretty(&ctx.config)?);
                Ok(())
            }
            Config::Set(cmd) => {
                let mut config = ctx.config.clone();
                apply(&mut config, cmd.key, Some(cmd.value.clone()));
                config.save(&ctx.paths.config_dir)?;
                println!("Updated {}", ctx.paths.config_dir.join(CONFIG_FILE).display());
                Ok(())
            }
            Config::Unset(cmd) => {
                let mut config = ctx.config.clone();
                apply(&mut config, cmd.key, None);
                config.save(&ctx.paths.config_dir)?;
                println!("Updated {}", ctx.paths.config_dir.join(CONFIG_FILE).display());
                Ok(())
            }
        }
    }
}

fn apply(config: &mut ToolConfig, key: ConfigKey, value: Option<PathBuf>) {
    match key {
        ConfigKey::InstallDir => config.install_dir = value,
        ConfigKey::WorkbenchSource => config.workbench_source = value,
    }
}
