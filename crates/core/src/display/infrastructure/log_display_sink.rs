use crate::display::domain::display_sink::{DisplaySink, TickView};
use crate::presence::domain::presence_state::PresenceState;
use crate::session::domain::session_config::DisplayMode;
use crate::shared::frame::Frame;

/// Headless display: reports status changes through the `log` crate.
///
/// In debug mode every tick is also logged at debug level with the
/// detection count and absence counter.
#[derive(Default)]
pub struct LogDisplaySink {
    last_status: Option<PresenceState>,
    transitions: usize,
}

impl LogDisplaySink {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn transitions(&self) -> usize {
        self.transitions
    }
}

impl DisplaySink for LogDisplaySink {
    fn present(&mut self, _frame: &Frame, view: &TickView) {
        if view.mode == DisplayMode::Debug {
            log::debug!(
                "frame {}: status={} faces={} absence={}/{}",
                view.frame_index,
                view.status.map_or("DEGRADED", |s| s.as_str()),
                view.detection_count,
                view.absence_counter,
                view.tolerance
            );
        }

        let Some(status) = view.status else {
            return;
        };
        if self.last_status != Some(status) {
            if self.last_status.is_some() {
                self.transitions += 1;
                log::info!("Status: {} (change {})", status.label(), self.transitions);
            } else {
                log::info!("Status: {}", status.label());
            }
            self.last_status = Some(status);
        }
        if view.evidence_saved {
            log::info!("Evidence captured at frame {}", view.frame_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(status: Option<PresenceState>) -> TickView {
        TickView {
            frame_index: 0,
            status,
            detection_count: 0,
            absence_counter: 0,
            tolerance: 3,
            evidence_saved: false,
            mode: DisplayMode::Debug,
        }
    }

    #[test]
    fn test_counts_transitions_and_ignores_degraded_ticks() {
        let frame = Frame::filled(4, 4, [0, 0, 0], 0);
        let mut sink = LogDisplaySink::new();
        for status in [
            Some(PresenceState::Present),
            Some(PresenceState::Present),
            None,
            Some(PresenceState::Recovering),
            Some(PresenceState::Absent),
            None,
            Some(PresenceState::Absent),
            Some(PresenceState::Present),
        ] {
            sink.present(&frame, &view(status));
        }
        assert_eq!(sink.transitions(), 3);
    }
}
