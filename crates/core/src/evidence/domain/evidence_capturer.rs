use std::time::{Duration, Instant};

use crate::presence::domain::presence_state::PresenceState;
use crate::shared::clock::Timestamp;
use crate::shared::frame::Frame;
use crate::shared::storage_error::StorageError;

use super::evidence_store::{EvidenceArtifact, EvidenceStore};

/// Rate-limited snapshot policy for absence violations.
///
/// A capture fires only on an `Absent` tick and only when strictly more
/// than `min_interval` has elapsed since the previous capture (or none
/// has happened yet). However long the absence lasts, at most one
/// snapshot lands in any `min_interval` window.
#[derive(Debug, Clone)]
pub struct EvidenceCapturer {
    min_interval: Duration,
    last_capture: Option<Instant>,
}

impl EvidenceCapturer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_capture: None,
        }
    }

    /// Whether a capture would fire for this status at `now`.
    pub fn is_due(&self, status: PresenceState, now: Instant) -> bool {
        status == PresenceState::Absent
            && self
                .last_capture
                .map_or(true, |last| now.saturating_duration_since(last) > self.min_interval)
    }

    /// Persists `frame` through `store` when a capture is due.
    ///
    /// The evidence clock advances on every triggered attempt, including one
    /// whose write fails, so a broken store is retried at the same rate.
    pub fn maybe_capture(
        &mut self,
        frame: &Frame,
        status: PresenceState,
        now: &Timestamp,
        store: &dyn EvidenceStore,
    ) -> Result<Option<EvidenceArtifact>, StorageError> {
        if !self.is_due(status, now.instant) {
            return Ok(None);
        }
        self.last_capture = Some(now.instant);

        let path = store.persist(frame, &now.wall)?;
        log::info!("Absence evidence saved to {}", path.display());
        Ok(Some(EvidenceArtifact {
            path,
            captured_at: now.wall,
            frame_index: frame.index(),
        }))
    }

    pub fn last_capture(&self) -> Option<Instant> {
        self.last_capture
    }

    pub fn reset(&mut self) {
        self.last_capture = None;
    }
}
