//! Violation detector using a YOLOv8-family ONNX model via `ort`.
//!
//! Handles letterbox preprocessing, inference, best-class selection per
//! anchor and per-class NMS post-processing. Class indices outside the
//! configured table are dropped at decode time.

use std::path::Path;

use log::debug;

use crate::detection::domain::violation_detector::{Detection, ViolationDetector};
use crate::shared::bbox::{bbox_iou, BBox};
use crate::shared::constants::DEFAULT_IOU;
use crate::shared::execution_provider::platform_execution_providers;
use crate::shared::frame::Frame;
use crate::violations::class::ViolationClass;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub struct OnnxViolationDetector {
    session: ort::session::Session,
    input_size: u32,
    iou_threshold: f32,
}

impl OnnxViolationDetector {
    /// Load a detection ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape
    /// (expecting NCHW); falls back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(platform_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    // [N, C, H, W] — H and W are equal for square inputs
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            input_size,
            iou_threshold: DEFAULT_IOU,
        })
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }
}

impl ViolationDetector for OnnxViolationDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();

        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("detection model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        // YOLOv8 emits [1, 4 + classes, anchors]; some exports transpose
        // the trailing axes. Handle both.
        let (num_dets, num_feats, transposed) = match shape {
            [_, a, b] if a < b => (*b, *a, true),
            [_, a, b] => (*a, *b, false),
            _ => return Err(format!("unexpected model output shape: {shape:?}").into()),
        };
        if num_feats < 5 {
            return Err(format!("model output carries no class scores: {shape:?}").into());
        }

        let data = tensor.as_slice().ok_or("cannot view model output as slice")?;

        // 3. Parse detections: best class per anchor above the threshold
        let mut raw = Vec::new();
        for i in 0..num_dets {
            let feat = |f: usize| {
                if transposed {
                    data[f * num_dets + i]
                } else {
                    data[i * num_feats + f]
                }
            };

            let scores: Vec<f32> = (4..num_feats).map(feat).collect();
            let Some((class_index, confidence)) = best_class(&scores) else {
                continue;
            };
            if confidence < confidence_threshold {
                continue;
            }
            let Some(class) = ViolationClass::from_index(class_index) else {
                continue;
            };

            let b = to_source_box(feat(0), feat(1), feat(2), feat(3), scale, pad_x, pad_y);
            raw.push(RawDetection {
                x1: b[0],
                y1: b[1],
                x2: b[2],
                y2: b[3],
                confidence,
                class,
            });
        }

        // 4. NMS
        let kept = nms(&mut raw, self.iou_threshold);
        debug!("frame {}: {} detections after NMS", frame.index(), kept.len());

        Ok(kept
            .into_iter()
            .map(|d| Detection {
                class: d.class,
                confidence: d.confidence,
                bbox: BBox::new(
                    d.x1.round() as i32,
                    d.y1.round() as i32,
                    d.x2.round() as i32,
                    d.y2.round() as i32,
                )
                .clamped(fw, fh),
            })
            .collect())
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

    // Pad with 114/255 gray, the YOLO training convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
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

/// Center-box in letterbox coordinates → corner-box in source pixels.
fn to_source_box(cx: f32, cy: f32, w: f32, h: f32, scale: f64, pad_x: u32, pad_y: u32) -> [f32; 4] {
    let s = scale as f32;
    let px = pad_x as f32;
    let py = pad_y as f32;
    [
        (cx - w / 2.0 - px) / s,
        (cy - h / 2.0 - py) / s,
        (cx + w / 2.0 - px) / s,
        (cy + h / 2.0 - py) / s,
    ]
}

/// Highest-scoring class column for one anchor.
fn best_class(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((index, score));
        }
    }
    best
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    class: ViolationClass,
}

/// Greedy per-class NMS: sort by confidence descending, suppress
/// same-class boxes overlapping an already-kept one.
fn nms(dets: &mut [RawDetection], iou_thresh: f32) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class != dets[i].class {
                continue;
            }
            let iou = bbox_iou(
                &[dets[i].x1, dets[i].y1, dets[i].x2, dets[i].y2],
                &[dets[j].x1, dets[j].y1, dets[j].x2, dets[j].y2],
            );
            if iou > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn raw(class: ViolationClass, confidence: f32, x1: f32, y1: f32) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2: x1 + 100.0,
            y2: y1 + 100.0,
            confidence,
            class,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 frame → letterbox to 640x640
        // scale = min(640/200, 640/100) = 3.2, new = 640x320, pad_y = 160
        let data = vec![128u8; 200 * 100 * 3];
        let frame = Frame::new(data, 200, 100, 3, 0, Duration::ZERO);
        let (tensor, scale, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert!((scale - 3.2).abs() < 0.01);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_square_frame() {
        let data = vec![128u8; 100 * 100 * 3];
        let frame = Frame::new(data, 100, 100, 3, 0, Duration::ZERO);
        let (tensor, scale, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert!((scale - 6.4).abs() < 0.01);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 0);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let data = vec![255u8; 100 * 50 * 3];
        let frame = Frame::new(data, 100, 50, 3, 0, Duration::ZERO);
        let (tensor, _, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(pad_x, 0);
        assert!(pad_y > 0);

        // image region is ~1.0, pad region is ~114/255
        let y = pad_y as usize + 1;
        assert!((tensor[[0, 0, y, 1]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_to_source_box_identity_without_letterboxing() {
        let b = to_source_box(50.0, 60.0, 20.0, 40.0, 1.0, 0, 0);
        assert_eq!(b, [40.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_to_source_box_removes_pad_and_scale() {
        // source 200x100 → scale 3.2, pad_y 160
        // a box centered at source (100, 50) sits at (320, 320) letterboxed
        let b = to_source_box(320.0, 320.0, 64.0, 64.0, 3.2, 0, 160);
        assert!((b[0] - 90.0).abs() < 0.01);
        assert!((b[1] - 40.0).abs() < 0.01);
        assert!((b[2] - 110.0).abs() < 0.01);
        assert!((b[3] - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_best_class_picks_argmax() {
        assert_eq!(best_class(&[0.1, 0.7, 0.3, 0.2]), Some((1, 0.7)));
        assert_eq!(best_class(&[0.4]), Some((0, 0.4)));
        assert_eq!(best_class(&[]), None);
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let mut dets = vec![
            raw(ViolationClass::Phone, 0.9, 0.0, 0.0),
            raw(ViolationClass::Phone, 0.8, 5.0, 5.0),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_cross_class_overlap() {
        // a bottle in a hand can overlap a phone box almost entirely
        let mut dets = vec![
            raw(ViolationClass::Phone, 0.9, 0.0, 0.0),
            raw(ViolationClass::Bottle, 0.8, 5.0, 5.0),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_keeps_distant_same_class() {
        let mut dets = vec![
            raw(ViolationClass::Food, 0.9, 0.0, 0.0),
            raw(ViolationClass::Food, 0.8, 400.0, 400.0),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_orders_by_confidence() {
        let mut dets = vec![
            raw(ViolationClass::Sleeping, 0.5, 0.0, 0.0),
            raw(ViolationClass::Sleeping, 0.9, 2.0, 2.0),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut dets: Vec<RawDetection> = Vec::new();
        assert!(nms(&mut dets, 0.3).is_empty());
    }
}
