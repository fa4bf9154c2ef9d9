use crate::presence::domain::presence_state::PresenceState;
use crate::session::domain::session_config::DisplayMode;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::display_sink::TickView;

pub type Rgb = [u8; 3];

pub const PRESENT_COLOR: Rgb = [0, 180, 0];
pub const RECOVERING_COLOR: Rgb = [255, 170, 0];
pub const ABSENT_COLOR: Rgb = [255, 0, 0];
pub const DEGRADED_COLOR: Rgb = [128, 128, 128];
const DEBUG_TRACK_COLOR: Rgb = [60, 60, 60];
const DEBUG_FILL_COLOR: Rgb = [200, 200, 200];

const MARGIN_X: i32 = 20;
const INDICATOR_Y: i32 = 15;
const INDICATOR_SIZE: i32 = 20;
const BAR_Y: i32 = 45;
const BAR_WIDTH: i32 = 120;
const BAR_HEIGHT: i32 = 8;
const MARKER_Y: i32 = 60;
const MARKER_SIZE: i32 = 6;
const MARKER_STEP: i32 = 10;
const MAX_MARKERS: usize = 10;

pub fn status_color(status: Option<PresenceState>) -> Rgb {
    match status {
        Some(PresenceState::Present) => PRESENT_COLOR,
        Some(PresenceState::Recovering) => RECOVERING_COLOR,
        Some(PresenceState::Absent) => ABSENT_COLOR,
        None => DEGRADED_COLOR,
    }
}

/// Draws the supervision overlay onto an RGB frame.
///
/// Every mode gets a status-colored outline per detected face and a status
/// block in the top-left corner. Debug mode adds an absence-counter bar
/// (full at the tolerance) and one marker per detection.
pub struct FrameAnnotator {
    line_width: i32,
}

impl FrameAnnotator {
    pub fn new(line_width: u32) -> Self {
        Self {
            line_width: line_width.max(1) as i32,
        }
    }

    pub fn annotate(&self, frame: &mut Frame, regions: &[Region], view: &TickView) {
        if frame.channels() != 3 {
            return;
        }
        let color = status_color(view.status);

        for r in regions {
            self.outline(frame, r.x, r.y, r.width, r.height, color);
        }
        fill_rect(frame, MARGIN_X, INDICATOR_Y, INDICATOR_SIZE, INDICATOR_SIZE, color);

        if view.mode == DisplayMode::Debug {
            self.draw_debug(frame, view);
        }
    }

    fn draw_debug(&self, frame: &mut Frame, view: &TickView) {
        fill_rect(frame, MARGIN_X, BAR_Y, BAR_WIDTH, BAR_HEIGHT, DEBUG_TRACK_COLOR);
        let fraction = if view.tolerance == 0 {
            if view.absence_counter > 0 {
                1.0
            } else {
                0.0
            }
        } else {
            (view.absence_counter as f64 / view.tolerance as f64).min(1.0)
        };
        let filled = (BAR_WIDTH as f64 * fraction).round() as i32;
        fill_rect(
            frame,
            MARGIN_X,
            BAR_Y,
            filled,
            BAR_HEIGHT,
            status_color(view.status),
        );

        for i in 0..view.detection_count.min(MAX_MARKERS) {
            let x = MARGIN_X + i as i32 * MARKER_STEP;
            fill_rect(frame, x, MARKER_Y, MARKER_SIZE, MARKER_SIZE, DEBUG_FILL_COLOR);
        }
    }

    fn outline(&self, frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        let t = self.line_width.min(w).min(h);
        if t <= 0 {
            return;
        }
        fill_rect(frame, x, y, w, t, color);
        fill_rect(frame, x, y + h - t, w, t, color);
        fill_rect(frame, x, y, t, h, color);
        fill_rect(frame, x + w - t, y, t, h, color);
    }
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Fills a rectangle, silently clipped to the frame.
fn fill_rect(frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
    let fw = frame.width() as i32;
    let fh = frame.height() as i32;
    let x0 = x.clamp(0, fw);
    let y0 = y.clamp(0, fh);
    let x1 = (x + w).clamp(0, fw);
    let y1 = (y + h).clamp(0, fh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let mut pixels = frame.as_ndarray_mut();
    for row in y0 as usize..y1 as usize {
        for col in x0 as usize..x1 as usize {
            for (c, value) in color.iter().enumerate() {
                pixels[[row, col, c]] = *value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(status: Option<PresenceState>, mode: DisplayMode) -> TickView {
        TickView {
            frame_index: 0,
            status,
            detection_count: 2,
            absence_counter: 0,
            tolerance: 10,
            evidence_saved: false,
            mode,
        }
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> Rgb {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    #[test]
    fn test_region_outline_uses_status_color() {
        let mut frame = Frame::filled(200, 150, [0, 0, 0], 0);
        let region = Region::new(100, 80, 40, 30, 0.9);
        FrameAnnotator::default().annotate(
            &mut frame,
            &[region],
            &view(Some(PresenceState::Present), DisplayMode::Exam),
        );

        assert_eq!(pixel(&frame, 100, 80), PRESENT_COLOR);
        assert_eq!(pixel(&frame, 139, 109), PRESENT_COLOR);
        // Interior untouched
        assert_eq!(pixel(&frame, 120, 95), [0, 0, 0]);
    }

    #[test]
    fn test_indicator_reflects_status() {
        for (status, color) in [
            (Some(PresenceState::Present), PRESENT_COLOR),
            (Some(PresenceState::Recovering), RECOVERING_COLOR),
            (Some(PresenceState::Absent), ABSENT_COLOR),
            (None, DEGRADED_COLOR),
        ] {
            let mut frame = Frame::filled(100, 100, [0, 0, 0], 0);
            FrameAnnotator::default().annotate(&mut frame, &[], &view(status, DisplayMode::Exam));
            assert_eq!(pixel(&frame, 25, 20), color);
        }
    }

    #[test]
    fn test_debug_overlay_only_in_debug_mode() {
        let mut exam = Frame::filled(200, 100, [0, 0, 0], 0);
        let mut debug = exam.clone();
        let mut v = view(Some(PresenceState::Recovering), DisplayMode::Exam);
        v.absence_counter = 5;
        FrameAnnotator::default().annotate(&mut exam, &[], &v);
        v.mode = DisplayMode::Debug;
        FrameAnnotator::default().annotate(&mut debug, &[], &v);

        // Bar half filled (5 of 10), remainder is track color.
        assert_eq!(pixel(&exam, 25, 47), [0, 0, 0]);
        assert_eq!(pixel(&debug, 25, 47), RECOVERING_COLOR);
        assert_eq!(pixel(&debug, 130, 47), DEBUG_TRACK_COLOR);
        // Two detection markers.
        assert_eq!(pixel(&debug, 21, 61), DEBUG_FILL_COLOR);
        assert_eq!(pixel(&debug, 31, 61), DEBUG_FILL_COLOR);
        assert_eq!(pixel(&debug, 41, 61), [0, 0, 0]);
    }

    #[test]
    fn test_tiny_frame_and_offscreen_region_do_not_panic() {
        let mut frame = Frame::filled(8, 8, [0, 0, 0], 0);
        let offscreen = Region::new(-50, -50, 20, 20, 0.5);
        let mut v = view(Some(PresenceState::Absent), DisplayMode::Debug);
        v.absence_counter = 99;
        FrameAnnotator::new(3).annotate(&mut frame, &[offscreen], &v);
        assert_eq!(pixel(&frame, 0, 0), [0, 0, 0]);
    }
}
