use std::path::PathBuf;

use crate::shared::storage_error::StorageError;

use super::session_recorder::SessionLog;
use super::session_summary::{SessionId, SessionSummary};

/// Durable storage for finished sessions.
pub trait SessionStore: Send {
    /// Persists the ordered log under an identifier derived from `session_id`.
    fn persist_log(&self, session_id: &SessionId, log: &SessionLog)
        -> Result<PathBuf, StorageError>;

    fn persist_summary(&self, summary: &SessionSummary) -> Result<PathBuf, StorageError>;
}
