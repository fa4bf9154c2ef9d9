use serde::{Deserialize, Serialize};

/// An axis-aligned detection rectangle in frame pixel coordinates.
///
/// The presence logic only ever looks at how many of these a detector
/// returned; geometry is kept for the display overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    /// Builds a region from corner coordinates, clamped to the frame.
    ///
    /// Returns `None` when nothing of the box remains inside the frame.
    pub fn from_corners(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        frame_width: u32,
        frame_height: u32,
        confidence: f64,
    ) -> Option<Self> {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        let left = x1.max(0.0).min(fw);
        let top = y1.max(0.0).min(fh);
        let right = x2.max(0.0).min(fw);
        let bottom = y2.max(0.0).min(fh);

        let width = (right - left).round() as i32;
        let height = (bottom - top).round() as i32;
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self::new(
            left.round() as i32,
            top.round() as i32,
            width,
            height,
            confidence,
        ))
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn iou(&self, other: &Region) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() as f64 + other.area() as f64 - inter)
    }
}
