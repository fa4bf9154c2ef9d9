use std::path::PathBuf;

use crate::display::domain::display_sink::{DisplaySink, TickView};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Periodically overwrites a single preview image with the latest
/// annotated frame, so an operator can watch the session from an image
/// viewer that reloads on change.
pub struct SnapshotDisplaySink {
    path: PathBuf,
    every: usize,
    writer: Box<dyn ImageWriter>,
    presented: usize,
}

impl SnapshotDisplaySink {
    pub fn new(path: impl Into<PathBuf>, every: usize, writer: Box<dyn ImageWriter>) -> Self {
        Self {
            path: path.into(),
            every: every.max(1),
            writer,
            presented: 0,
        }
    }
}

impl DisplaySink for SnapshotDisplaySink {
    fn present(&mut self, frame: &Frame, _view: &TickView) {
        let due = self.presented % self.every == 0;
        self.presented += 1;
        if !due {
            return;
        }
        if let Err(e) = self.writer.write(&self.path, frame, None) {
            log::warn!("Failed to write preview {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::domain::presence_state::PresenceState;
    use crate::session::domain::session_config::DisplayMode;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct RecordingWriter {
        frames: Arc<Mutex<Vec<usize>>>,
        attempts: Arc<Mutex<usize>>,
        fail: bool,
    }

    impl ImageWriter for RecordingWriter {
        fn write(
            &self,
            _path: &Path,
            frame: &Frame,
            _size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            *self.attempts.lock().unwrap() += 1;
            if self.fail {
                return Err("disk full".into());
            }
            self.frames.lock().unwrap().push(frame.index());
            Ok(())
        }
    }

    fn view() -> TickView {
        TickView {
            frame_index: 0,
            status: Some(PresenceState::Present),
            detection_count: 1,
            absence_counter: 0,
            tolerance: 3,
            evidence_saved: false,
            mode: DisplayMode::Exam,
        }
    }

    #[test]
    fn test_writes_every_nth_frame() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let writer = RecordingWriter {
            frames: frames.clone(),
            attempts: Arc::new(Mutex::new(0)),
            fail: false,
        };
        let mut sink = SnapshotDisplaySink::new("preview.jpg", 3, Box::new(writer));
        for i in 0..7 {
            sink.present(&Frame::filled(2, 2, [0, 0, 0], i), &view());
        }
        assert_eq!(*frames.lock().unwrap(), vec![0, 3, 6]);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let attempts = Arc::new(Mutex::new(0));
        let writer = RecordingWriter {
            frames: frames.clone(),
            attempts: attempts.clone(),
            fail: true,
        };
        let mut sink = SnapshotDisplaySink::new("preview.jpg", 1, Box::new(writer));
        sink.present(&Frame::filled(2, 2, [0, 0, 0], 0), &view());
        sink.present(&Frame::filled(2, 2, [0, 0, 0], 1), &view());
        assert_eq!(*attempts.lock().unwrap(), 2);
        assert!(frames.lock().unwrap().is_empty());
    }
}
