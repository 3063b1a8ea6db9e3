use std::fs;

use crate::error::AppError;
use crate::oplog::{OpLog, OpReport};
use crate::paths::{PatchContext, PathSet};

use data_error::QpatchError;

/*
Literal substitutions against the bundled workbench script. The
needles are exact substrings of a specific upstream build; when a
needle is absent the entry is skipped silently, which covers both
"already patched" and "different Qoder version".
*/
// TODO: the toast needle matches its own replacement, so a second run
// stacks another "hidden" class; harmless but worth an anchor.
pub const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("<div>Pro Trial", "<div>Pro"),
    ("py-1\">Auto-select", "py-1\">Bypass-Version-Pin"),
    (
        "async getEffectiveTokenLimit(e){const n=e.modelName;if(!n)return 2e5;",
        "async getEffectiveTokenLimit(e){return 9000000;const n=e.modelName;if(!n)return 9e5;",
    ),
    ("notifications-toasts", "notifications-toasts hidden"),
];

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "bypass", about = "Patch the workbench script to lift usage limits")]
pub struct Bypass {}

impl Bypass {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let (report, _) = OpReport::capture(OpLog::echoing(), |log| {
            bypass_limits(&ctx.paths, log)
        });
        super::finish(report)
    }
}

pub fn bypass_limits(paths: &PathSet, log: &mut OpLog) -> Result<(), AppError> {
    log.info("Starting token limit bypass...");

    if !paths.workbench_js.exists() {
        return Err(QpatchError::source_not_found(&paths.workbench_js).into());
    }

    let backup = fs_backup::scoped_backup(&paths.workbench_js)?;
    log.info(format!("Backup created: {}", backup.display()));

    let mut content = fs::read_to_string(&paths.workbench_js)?;
    let mut applied = 0;
    for (needle, replacement) in SUBSTITUTIONS {
        if content.contains(needle) {
            content = content.replacen(needle, replacement, 1);
            applied += 1;
        }
    }

    if applied > 0 {
        fs::write(&paths.workbench_js, &content)?;
        log.ok(format!(
            "Token limit bypass applied ({applied} of {} substitutions)",
            SUBSTITUTIONS.len()
        ));
    } else {
        log.info("No modifications needed or already applied");
    }

    Ok(())
}
