use std::process::{Command, Stdio};

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, TargetOs};

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "quit", about = "Terminate running Qoder processes")]
pub struct Quit {}

impl Quit {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            quit_qoder(ctx.os, log)
        });
        super::finish(report)
    }
}

/// Kill the target so patched files are not rewritten underneath us.
/// Nothing running is also success.
pub fn quit_qoder(os: TargetOs, log: &mut OpLog) -> Result<(), AppError> {
    log.info("Attempting to close Qoder...");

    let status = match os {
        TargetOs::Windows => Command::new("taskkill")
            .args(["/F", "/IM", "Qoder.exe", "/T"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
        TargetOs::Macos | TargetOs::Linux => Command::new("pkill")
            .args(["-f", "Qoder"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    };

    match status {
        Ok(code) if code.success() => log.ok("Qoder processes terminated"),
        _ => log.info("No Qoder processes found or already closed"),
    }

    Ok(())
}
