//! Face detector backed by a YOLO-face ONNX model via `ort`.
//!
//! Letterbox preprocessing, inference and NMS; no tracking. Each call is
//! independent, which keeps the detector a pure black box for the
//! presence tracker.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Loads the model. Input resolution is read from the NCHW input shape,
    /// falling back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(platform_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded face model {} (input {input_size}px, confidence {confidence})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

/// Hardware provider for the current platform; ort falls back to CPU when
/// it is unavailable.
fn platform_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected face model output shape: {shape:?}").into());
        }

        // Output is [1, features, detections] or [1, detections, features].
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Ok(Vec::new());
        }

        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let feature = |det: usize, feat: usize| -> f64 {
            let idx = if transposed {
                feat * num_dets + det
            } else {
                det * num_feats + feat
            };
            data[idx] as f64
        };

        // Row layout: [cx, cy, w, h, conf, ...keypoints]
        let mut regions = Vec::new();
        for i in 0..num_dets {
            let conf = feature(i, 4);
            if conf < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            let region = Region::from_corners(
                (cx - w / 2.0 - pad_x as f64) / scale,
                (cy - h / 2.0 - pad_y as f64) / scale,
                (cx + w / 2.0 - pad_x as f64) / scale,
                (cy + h / 2.0 - pad_y as f64) / scale,
                frame.width(),
                frame.height(),
                conf,
            );
            regions.extend(region);
        }

        Ok(nms(regions, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is YOLO gray (114).
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy NMS: highest confidence first, suppress boxes overlapping a kept one.
fn nms(mut regions: Vec<Region>, iou_thresh: f64) -> Vec<Region> {
    regions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Region> = Vec::new();
    for region in regions {
        if keep.iter().all(|k| k.iou(&region) <= iou_thresh) {
            keep.push(region);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: i32, y: i32, size: i32, confidence: f64) -> Region {
        Region::new(x, y, size, size, confidence)
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, content 640x320, pad_y 160
        let frame = Frame::filled(200, 100, [128, 128, 128], 0);
        let (tensor, scale, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert!((scale - 3.2).abs() < 0.01);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::filled(100, 50, [255, 255, 255], 0);
        let (tensor, _, pad_x, pad_y) = letterbox(&frame, 640);

        let y = pad_y as usize + 1;
        let x = pad_x as usize + 1;
        assert!((tensor[[0, 0, y, x]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let dets = vec![det(0, 0, 100, 0.8), det(5, 5, 100, 0.9)];
        let kept = nms(dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_separate_faces() {
        let dets = vec![det(0, 0, 50, 0.9), det(200, 200, 50, 0.8)];
        assert_eq!(nms(dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_keeps_overlap_at_threshold() {
        // 50x100 overlap of two 100x100 boxes: IoU = 5000 / 15000
        let dets = vec![det(0, 0, 100, 0.9), det(50, 0, 100, 0.7)];
        assert_eq!(nms(dets.clone(), 0.3).len(), 1);
        assert_eq!(nms(dets, 0.34).len(), 2);
    }

    #[test]
    fn test_nms_orders_by_confidence() {
        let dets = vec![det(0, 0, 10, 0.5), det(100, 0, 10, 0.95), det(200, 0, 10, 0.7)];
        let confidences: Vec<f64> = nms(dets, 0.45).iter().map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![0.95, 0.7, 0.5]);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.3).is_empty());
    }
}
