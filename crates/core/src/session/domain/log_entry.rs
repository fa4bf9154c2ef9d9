use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::presence::domain::presence_state::PresenceState;

/// One row of the session history: what the tracker concluded on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub status: PresenceState,
    pub detection_count: usize,
}

impl LogEntry {
    pub const CSV_HEADER: &'static str = "Time,Status,Faces";

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.status.as_str(),
            self.detection_count
        )
    }
}
