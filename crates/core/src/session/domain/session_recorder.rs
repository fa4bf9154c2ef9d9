use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presence::domain::presence_state::PresenceState;

use super::log_entry::LogEntry;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecorderError {
    #[error("session log was already finalized")]
    AlreadyFinalized,
}

/// Entry counts per status. Every status is always present, possibly as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts(BTreeMap<PresenceState, usize>);

impl StatusCounts {
    fn tally(entries: &[LogEntry]) -> Self {
        let mut counts: BTreeMap<PresenceState, usize> =
            PresenceState::ALL.iter().map(|&s| (s, 0)).collect();
        for entry in entries {
            *counts.entry(entry.status).or_default() += 1;
        }
        Self(counts)
    }

    pub fn get(&self, status: PresenceState) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }
}

/// Complete, ordered history of one session, handed out by
/// [`SessionRecorder::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.entries)
    }

    /// The last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> &[LogEntry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }

    /// Full export as CSV, header included.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(32 * (self.entries.len() + 1));
        out.push_str(LogEntry::CSV_HEADER);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.to_csv_row());
            out.push('\n');
        }
        out
    }
}

/// Append-only in-memory log for the running session.
///
/// The whole history is held until [`finalize`](Self::finalize), so memory
/// grows linearly with session length.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    entries: Vec<LogEntry>,
    finalized: bool,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        timestamp: DateTime<Local>,
        status: PresenceState,
        detection_count: usize,
    ) -> Result<(), RecorderError> {
        if self.finalized {
            return Err(RecorderError::AlreadyFinalized);
        }
        self.entries.push(LogEntry {
            timestamp,
            status,
            detection_count,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hands over the recorded history. Only the first call succeeds.
    pub fn finalize(&mut self) -> Result<SessionLog, RecorderError> {
        if self.finalized {
            return Err(RecorderError::AlreadyFinalized);
        }
        self.finalized = true;
        Ok(SessionLog {
            entries: std::mem::take(&mut self.entries),
        })
    }
}
