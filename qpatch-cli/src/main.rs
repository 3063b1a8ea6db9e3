use clap::Parser;

mod commands;
mod config;
mod error;
mod oplog;
mod paths;
mod util;

use commands::Commands;
use paths::PatchContext;

#[derive(Parser, Debug)]
#[clap(name = "qpatch-cli")]
#[clap(about = "Patch a local Qoder installation and its stored state", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let ctx = PatchContext::from_process()?;
    cli.command.run(&ctx)?;

    Ok(())
}
