use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot open video source {location}: {reason}")]
    Open { location: String, reason: String },
    #[error("video source is not open")]
    NotOpen,
    #[error("video source has no more frames")]
    Exhausted,
    #[error("failed to read frame: {0}")]
    Read(String),
}

/// Pull-based frame source (camera, file or stream).
///
/// `read` blocks until the next frame is available. Any error from `read`
/// ends the current session; the controller then calls `release`.
pub trait VideoSource: Send {
    fn open(&mut self) -> Result<VideoMetadata, SourceError>;

    fn read(&mut self) -> Result<Frame, SourceError>;

    /// Releases the device. Safe to call when not open.
    fn release(&mut self);
}
