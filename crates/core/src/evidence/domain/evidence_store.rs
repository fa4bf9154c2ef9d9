use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::shared::storage_error::StorageError;

/// A persisted snapshot taken as proof of sustained absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceArtifact {
    pub path: PathBuf,
    pub captured_at: DateTime<Local>,
    pub frame_index: usize,
}

/// Durable storage for evidence snapshots.
///
/// Implementations must derive a distinct identifier for every call, even
/// for two captures stamped with the same wall-clock time.
pub trait EvidenceStore: Send {
    fn persist(&self, frame: &Frame, captured_at: &DateTime<Local>)
        -> Result<PathBuf, StorageError>;
}
