//! Face detection and embedding using ONNX Runtime via `ort`.
//!
//! Pairs a YOLO-family face detector with an ArcFace-style embedding
//! model. Detected faces are cropped from the source frame, resized to
//! the embedder input and L2-normalized so that downstream comparisons
//! work with plain Euclidean distance.

use std::path::Path;

use crate::recognition::domain::face_engine::{FaceDetection, FaceEngine};
use crate::shared::bbox::{bbox_iou, BBox};
use crate::shared::execution_provider::platform_execution_providers;
use crate::shared::frame::Frame;

/// Fallback detector input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// ArcFace-style embedders take 112x112 crops.
const EMBED_INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Confidence threshold for face boxes.
const FACE_CONFIDENCE: f32 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.45;

pub struct OnnxFaceEngine {
    detector: ort::session::Session,
    embedder: ort::session::Session,
    detector_input_size: u32,
}

impl OnnxFaceEngine {
    pub fn new(
        detector_path: &Path,
        embedder_path: &Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = build_session(detector_path)?;
        let embedder = build_session(embedder_path)?;

        let detector_input_size = detector
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
            detector,
            embedder,
            detector_input_size,
        })
    }

    fn detect_boxes(&mut self, frame: &Frame) -> Result<Vec<BBox>, Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.detector_input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.detector.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        let (num_dets, num_feats, transposed) = match shape {
            [_, a, b] if a < b => (*b, *a, true),
            [_, a, b] => (*a, *b, false),
            _ => return Err(format!("unexpected face model output shape: {shape:?}").into()),
        };
        // [cx, cy, w, h, score, ...optional landmarks]
        if num_feats < 5 {
            return Err(format!("face model output too narrow: {shape:?}").into());
        }

        let data = tensor.as_slice().ok_or("cannot view model output as slice")?;

        let s = scale as f32;
        let px = pad_x as f32;
        let py = pad_y as f32;

        let mut raw = Vec::new();
        for i in 0..num_dets {
            let feat = |f: usize| {
                if transposed {
                    data[f * num_dets + i]
                } else {
                    data[i * num_feats + f]
                }
            };

            let score = feat(4);
            if score < FACE_CONFIDENCE {
                continue;
            }

            let (cx, cy, w, h) = (feat(0), feat(1), feat(2), feat(3));
            raw.push(RawFace {
                x1: (cx - w / 2.0 - px) / s,
                y1: (cy - h / 2.0 - py) / s,
                x2: (cx + w / 2.0 - px) / s,
                y2: (cy + h / 2.0 - py) / s,
                score,
            });
        }

        let kept = face_nms(&mut raw, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .map(|f| {
                BBox::new(
                    f.x1.round() as i32,
                    f.y1.round() as i32,
                    f.x2.round() as i32,
                    f.y2.round() as i32,
                )
                .clamped(fw, fh)
            })
            .collect())
    }

    fn embed(
        &mut self,
        rgb_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = embed_preprocess(rgb_data, width, height);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.embedder.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("cannot view embedding as slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

impl FaceEngine for OnnxFaceEngine {
    fn detect_faces(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let boxes = self.detect_boxes(frame)?;

        let mut faces = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let (crop_data, crop_w, crop_h) = crop(frame, &bbox);
            if crop_w == 0 || crop_h == 0 {
                continue;
            }
            let embedding = self.embed(&crop_data, crop_w, crop_h)?;
            faces.push(FaceDetection { bbox, embedding });
        }
        Ok(faces)
    }
}

fn build_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    Ok(ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(platform_execution_providers())?
        .commit_from_file(model_path)?)
}

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

/// Cut the bbox region out of the frame as a tightly packed RGB buffer.
///
/// The bbox is clamped to the frame first; a bbox entirely outside the
/// frame yields an empty buffer.
fn crop(frame: &Frame, bbox: &BBox) -> (Vec<u8>, u32, u32) {
    let clamped = bbox.clamped(frame.width(), frame.height());
    let w = clamped.width() as u32;
    let h = clamped.height() as u32;
    if w == 0 || h == 0 {
        return (Vec::new(), 0, 0);
    }

    let src = frame.data();
    let stride = frame.width() as usize * 3;
    let mut out = Vec::with_capacity((w * h * 3) as usize);
    for y in 0..h as usize {
        let sy = clamped.y1 as usize + y;
        let start = sy * stride + clamped.x1 as usize * 3;
        out.extend_from_slice(&src[start..start + w as usize * 3]);
    }
    (out, w, h)
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn embed_preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, EMBED_INPUT_SIZE, EMBED_INPUT_SIZE));

    for y in 0..EMBED_INPUT_SIZE {
        let src_y =
            (((y as f64 + 0.5) * src_h as f64 / EMBED_INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..EMBED_INPUT_SIZE {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / EMBED_INPUT_SIZE as f64) as usize)
                .min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[derive(Clone, Debug)]
struct RawFace {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

/// Greedy NMS: sort by score descending, suppress boxes overlapping an
/// already-kept one.
fn face_nms(faces: &mut [RawFace], iou_thresh: f32) -> Vec<RawFace> {
    faces.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; faces.len()];

    for i in 0..faces.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(faces[i].clone());
        for j in (i + 1)..faces.len() {
            if suppressed[j] {
                continue;
            }
            let iou = bbox_iou(
                &[faces[i].x1, faces[i].y1, faces[i].x2, faces[i].y2],
                &[faces[j].x1, faces[j].y1, faces[j].x2, faces[j].y2],
            );
            if iou > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}
