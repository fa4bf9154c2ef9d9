use std::fmt;

use serde::{Deserialize, Serialize};

/// Debounced presence classification for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresenceState {
    /// At least one detection this tick.
    Present,
    /// No detection, but the dropout is still within tolerance.
    Recovering,
    /// No detection for more ticks than the tolerance allows.
    Absent,
}

impl PresenceState {
    pub const ALL: [PresenceState; 3] = [
        PresenceState::Present,
        PresenceState::Recovering,
        PresenceState::Absent,
    ];

    /// Name written to the session log.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceState::Present => "PRESENT",
            PresenceState::Recovering => "RECOVERING",
            PresenceState::Absent => "ABSENT",
        }
    }

    /// Operator-facing label, as shown on the status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            PresenceState::Present => "Present",
            PresenceState::Recovering => "Face temporarily lost",
            PresenceState::Absent => "Absent",
        }
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
