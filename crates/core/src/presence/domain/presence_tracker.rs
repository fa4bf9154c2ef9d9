use super::presence_state::PresenceState;

/// Debounces a per-tick detection count into a [`PresenceState`].
///
/// Keeps a counter of consecutive ticks without any detection. A tick with
/// at least one detection resets it and is `Present`; an empty tick bumps
/// it and is `Absent` once the counter exceeds the tolerance, `Recovering`
/// until then.
///
/// The tolerance is fixed at construction so it cannot change while a
/// session is running; a new tolerance means a new tracker.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    tolerance: u32,
    absence_counter: u32,
}

impl PresenceTracker {
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            absence_counter: 0,
        }
    }

    /// Classifies one tick. Must be called exactly once per tick, in tick order.
    pub fn classify(&mut self, detection_count: usize) -> PresenceState {
        if detection_count > 0 {
            self.absence_counter = 0;
            return PresenceState::Present;
        }

        self.absence_counter = self.absence_counter.saturating_add(1);
        if self.absence_counter > self.tolerance {
            PresenceState::Absent
        } else {
            PresenceState::Recovering
        }
    }

    /// Consecutive empty ticks ending at the most recent tick.
    pub fn absence_counter(&self) -> u32 {
        self.absence_counter
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn reset(&mut self) {
        self.absence_counter = 0;
    }
}
