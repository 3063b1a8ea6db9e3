use clap::Subcommand;

pub mod auth;
pub mod bypass;
pub mod config_cmd;
pub mod disable_update;
pub mod full_reset;
pub mod info;
pub mod profile;
pub mod quit;
pub mod relocate;
pub mod reset_ids;
pub mod restore_workbench;
pub mod subscription;

use crate::error::AppError;
use crate::oplog::OpReport;
use crate::paths::PatchContext;

#[derive(Debug, Subcommand)]
pub enum Commands {
    ResetIds(reset_ids::ResetIds),
    Info(info::Info),
    Auth(auth::Auth),
    #[command(about = "Manage saved credential profiles")]
    Profile {
        #[clap(subcommand)]
        subcommand: profile::Profile,
    },
    DisableUpdate(disable_update::DisableUpdate),
    Relocate(relocate::Relocate),
    Bypass(bypass::Bypass),
    RestoreWorkbench(restore_workbench::RestoreWorkbench),
    Quit(quit::Quit),
    FullReset(full_reset::FullReset),
    Subscription(subscription::Subscription),
    #[command(about = "Inspect or edit the tool configuration")]
    Config {
        #[clap(subcommand)]
        subcommand: config_cmd::Config,
    },
}

impl Commands {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        match self {
            Commands::ResetIds(cmd) => cmd.run(ctx),
            Commands::Info(cmd) => cmd.run(ctx),
            Commands::Auth(cmd) => cmd.run(ctx),
            Commands::Profile { subcommand } => subcommand.run(ctx),
            Commands::DisableUpdate(cmd) => cmd.run(ctx),
            Commands::Relocate(cmd) => cmd.run(ctx),
            Commands::Bypass(cmd) => cmd.run(ctx),
            Commands::RestoreWorkbench(cmd) => cmd.run(ctx),
            Commands::Quit(cmd) => cmd.run(ctx),
            Commands::FullReset(cmd) => cmd.run(ctx),
            Commands::Subscription(cmd) => cmd.run(ctx),
            Commands::Config { subcommand } => subcommand.run(ctx),
        }
    }
}

/// The transcript has already been streamed; all that is left is the
/// process exit status.
pub(crate) fn finish(report: OpReport) -> Result<(), AppError> {
    if report.success {
        Ok(())
    } else {
        Err(AppError::OperationFailed(
            report
                .error
                .unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
