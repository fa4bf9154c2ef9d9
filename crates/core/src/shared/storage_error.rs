use std::path::PathBuf;

use thiserror::Error;

/// Failure to persist a session artifact (log, summary or evidence image).
///
/// Never fatal to a running session: the controller records it and the
/// session carries on.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}
