/// Properties of an opened video source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate; 0.0 when the source does not report one.
    pub fps: f64,
    pub codec: String,
    /// Device path, file path or URL the source was opened from.
    pub location: String,
}
