use crate::presence::domain::presence_state::PresenceState;
use crate::session::domain::session_config::DisplayMode;
use crate::shared::frame::Frame;

/// What happened on the tick whose frame is being presented.
#[derive(Debug, Clone, PartialEq)]
pub struct TickView {
    pub frame_index: usize,
    /// `None` when detection failed and the tick was not classified.
    pub status: Option<PresenceState>,
    pub detection_count: usize,
    pub absence_counter: u32,
    pub tolerance: u32,
    pub evidence_saved: bool,
    pub mode: DisplayMode,
}

impl TickView {
    #[cfg(test)]
    pub fn is_degraded(&self) -> bool {
        self.status.is_none()
    }
}

/// Output port for annotated frames. Fire-and-forget: a sink handles its
/// own failures and never stops the tick loop.
pub trait DisplaySink: Send {
    fn present(&mut self, frame: &Frame, view: &TickView);
}
