use std::io;

use data_error::QpatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Qoder installation not found in expected locations")]
    InstallNotFound,

    #[error("This removes all Qoder settings and data; re-run with --yes to confirm")]
    ConfirmationRequired,

    #[error("Subscription query failed: {0}")]
    Subscription(String),

    #[error("File operation error: {0}")]
    FileOperationError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    HttpError(#[from] reqwest::Error),

    #[error(transparent)]
    QpatchError(#[from] QpatchError),
}
