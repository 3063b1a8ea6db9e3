use crate::error::AppError;
use crate::paths::{PatchContext, PathSet};
use crate::util;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "info", about = "Show the account Qoder is signed in with")]
pub struct Info {}

impl Info {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let info = account_info(&ctx.paths);

        println!("Email:         {}", info.email.as_deref().unwrap_or("-"));
        println!(
            "Access token:  {}",
            info.access_token.as_deref().unwrap_or("-")
        );
        println!(
            "Machine id:    {}",
            info.machine_id.as_deref().unwrap_or("-")
        );
        println!(
            "Device id:     {}",
            info.dev_device_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub email: Option<String>,
    pub access_token: Option<String>,
    pub machine_id: Option<String>,
    pub dev_device_id: Option<String>,
}

/// Read-only: document first, key-value store as fallback.
pub fn account_info(paths: &PathSet) -> AccountInfo {
    AccountInfo {
        email: util::lookup_value(paths, util::CACHED_EMAIL_KEY),
        access_token: util::lookup_value(paths, util::ACCESS_TOKEN_KEY),
        machine_id: util::lookup_value(paths, dev_ident::MACHINE_ID_KEY),
        dev_device_id: util::lookup_value(paths, dev_ident::DEV_DEVICE_ID_KEY),
    }
}
