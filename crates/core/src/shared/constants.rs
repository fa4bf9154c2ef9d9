use std::time::Duration;

pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Consecutive empty ticks tolerated before the subject counts as absent.
pub const DEFAULT_TOLERANCE: u32 = 40;
pub const RECOMMENDED_TOLERANCE: (u32, u32) = (10, 80);

/// Minimum gap between two evidence captures, in seconds.
pub const DEFAULT_EVIDENCE_INTERVAL_SECS: f64 = 6.0;
pub const RECOMMENDED_EVIDENCE_INTERVAL_SECS: (f64, f64) = (3.0, 15.0);

/// Throttle between ticks (~30 fps ceiling).
pub const DEFAULT_TICK_DELAY: Duration = Duration::from_millis(30);

/// Rows of the session log shown in the end-of-session preview.
pub const SUMMARY_TAIL_ROWS: usize = 20;

pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_EVIDENCE_DIR: &str = "screenshots";
pub const DEFAULT_CAMERA: &str = "/dev/video0";
