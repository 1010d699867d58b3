use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode task record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("archive already holds an entry for key {0}")]
    DuplicateKey(String),
}

#[derive(Debug, Error)]
pub enum TaskError {
    /// Archive entries are immutable once inserted.
    #[error("task {0} is already archived; updating archived tasks is not supported")]
    UpdateUnsupported(String),
    #[error("task storage unavailable")]
    Storage(#[from] StorageError),
}

pub type Result<T, E = TaskError> = std::result::Result<T, E>;
