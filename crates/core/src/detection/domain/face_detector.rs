use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for the presence detector.
///
/// Only the number of returned regions drives presence classification;
/// the rectangles themselves are used for the display overlay. An error
/// marks the tick as degraded rather than ending the session.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
