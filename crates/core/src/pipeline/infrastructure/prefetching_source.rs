use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{SourceError, VideoSource};

pub const DEFAULT_PREFETCH: usize = 2;

type FrameResult = Result<Frame, SourceError>;

/// Decodes frames on a background thread so capture overlaps detection.
///
/// The bounded channel keeps at most `capacity` frames in flight; the
/// reader blocks when the controller falls behind. The first error from
/// the wrapped source is forwarded and ends the reader.
pub struct PrefetchingSource {
    idle: Option<Box<dyn VideoSource>>,
    running: Option<Running>,
    capacity: usize,
}

struct Running {
    frames: Receiver<FrameResult>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<Box<dyn VideoSource>>,
}

impl PrefetchingSource {
    pub fn new(inner: Box<dyn VideoSource>, capacity: usize) -> Self {
        Self {
            idle: Some(inner),
            running: None,
            capacity: capacity.max(1),
        }
    }
}

impl VideoSource for PrefetchingSource {
    fn open(&mut self) -> Result<VideoMetadata, SourceError> {
        self.release();
        let mut inner = self.idle.take().ok_or(SourceError::NotOpen)?;
        let metadata = match inner.open() {
            Ok(m) => m,
            Err(e) => {
                self.idle = Some(inner);
                return Err(e);
            }
        };

        let (tx, rx) = bounded(self.capacity);
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = spawn_reader(inner, tx, cancelled.clone());
        self.running = Some(Running {
            frames: rx,
            cancelled,
            handle,
        });
        Ok(metadata)
    }

    fn read(&mut self) -> Result<Frame, SourceError> {
        let running = self.running.as_ref().ok_or(SourceError::NotOpen)?;
        running.frames.recv().unwrap_or(Err(SourceError::Exhausted))
    }

    fn release(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.cancelled.store(true, Ordering::Relaxed);
        drop(running.frames);
        match running.handle.join() {
            Ok(inner) => self.idle = Some(inner),
            Err(_) => log::error!("Frame reader thread panicked"),
        }
    }
}

impl Drop for PrefetchingSource {
    fn drop(&mut self) {
        self.release();
    }
}

fn spawn_reader(
    mut source: Box<dyn VideoSource>,
    frame_tx: crossbeam_channel::Sender<FrameResult>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn VideoSource>> {
    std::thread::spawn(move || {
        while !cancelled.load(Ordering::Relaxed) {
            let result = source.read();
            let failed = result.is_err();
            if frame_tx.send(result).is_err() || failed {
                break;
            }
        }
        source.release();
        source
    })
}
