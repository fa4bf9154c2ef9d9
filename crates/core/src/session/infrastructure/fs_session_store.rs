use std::fs;
use std::path::PathBuf;

use crate::session::domain::session_recorder::SessionLog;
use crate::session::domain::session_store::SessionStore;
use crate::session::domain::session_summary::{SessionId, SessionSummary};
use crate::shared::paths::{ensure_dir, unique_path};
use crate::shared::storage_error::StorageError;

/// Writes `session_<id>.csv` and `session_<id>_summary.json` into one directory.
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write(&self, stem: &str, ext: &str, contents: &str) -> Result<PathBuf, StorageError> {
        ensure_dir(&self.dir)?;
        let path = unique_path(&self.dir, stem, ext);
        fs::write(&path, contents).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl SessionStore for FsSessionStore {
    fn persist_log(
        &self,
        session_id: &SessionId,
        log: &SessionLog,
    ) -> Result<PathBuf, StorageError> {
        let path = self.write(&format!("session_{session_id}"), "csv", &log.to_csv())?;
        log::info!("Session log ({} entries) written to {}", log.len(), path.display());
        Ok(path)
    }

    fn persist_summary(&self, summary: &SessionSummary) -> Result<PathBuf, StorageError> {
        let stem = format!("session_{}_summary", summary.session_id);
        let json = serde_json::to_string_pretty(summary).map_err(|e| StorageError::Encode {
            path: self.dir.join(&stem),
            reason: e.to_string(),
        })?;
        self.write(&stem, "json", &json)
    }
}
