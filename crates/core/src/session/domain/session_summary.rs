use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::evidence::domain::evidence_store::EvidenceArtifact;
use crate::presence::domain::presence_state::PresenceState;

use super::log_entry::LogEntry;
use super::session_config::SessionConfig;
use super::session_recorder::StatusCounts;

/// Identifier of one session, derived from its start time (`YYYYmmdd_HHMMSS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn from_start(started_at: &DateTime<Local>) -> Self {
        Self(started_at.format("%Y%m%d_%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a session went back to idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    /// Operator stop command.
    Stopped,
    /// The video source failed or ran dry mid-session.
    SourceFailed { reason: String },
}

/// End-of-session report. Built once when the session stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub config: SessionConfig,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub end_reason: EndReason,
    /// Where the full log was written; `None` if writing it failed.
    pub log_file: Option<PathBuf>,
    pub entry_count: usize,
    pub status_counts: StatusCounts,
    /// Most recent log rows, oldest first.
    pub tail: Vec<LogEntry>,
    pub evidence: Vec<EvidenceArtifact>,
    /// Ticks whose detector call failed; these have no log entry.
    pub detector_failures: usize,
    pub storage_failures: Vec<String>,
}

impl SessionSummary {
    pub fn count(&self, status: PresenceState) -> usize {
        self.status_counts.get(status)
    }

    pub fn is_clean(&self) -> bool {
        self.storage_failures.is_empty() && matches!(self.end_reason, EndReason::Stopped)
    }
}
