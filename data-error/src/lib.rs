use std::io;
use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QpatchError>;

#[derive(Debug, Error)]
pub enum QpatchError {
    /// A file the operation was about to mutate does not exist.
    /// Raised before any write happens.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// The key-value store file is missing or cannot be opened as
    /// a SQLite database. Callers usually downgrade this to a warning.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

impl QpatchError {
    pub fn source_not_found(path: &Path) -> Self {
        QpatchError::SourceNotFound(path.display().to_string())
    }
}

impl From<&str> for QpatchError {
    fn from(msg: &str) -> Self {
        QpatchError::Other(msg.to_owned())
    }
}
