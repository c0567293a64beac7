//! SCRFD face detector via ONNX Runtime
//!
//! Runs the anchor-free SCRFD detection model (insightface `det_10g.onnx`)
//! on a letterboxed grayscale input and decodes per-stride score/box tensors
//! into pixel-space regions, with IoU suppression of overlapping candidates.

use super::{DetectError, FaceDetector, FaceRegion};
use image::{imageops, GrayImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

const INPUT_SIZE: u32 = 640;
const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 128.0;
const SCORE_THRESHOLD: f32 = 0.5;
const IOU_THRESHOLD: f32 = 0.4;
const STRIDES: [u32; 3] = [8, 16, 32];
const ANCHORS_PER_CELL: usize = 2;

/// Candidate box in original-image float coordinates, pre-suppression.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

/// Mapping from original image space to the letterboxed model input.
struct Letterbox {
    scale: f32,
    pad_x: u32,
    pad_y: u32,
}

pub struct ScrfdDetector {
    session: Session,
}

impl ScrfdDetector {
    /// Load the SCRFD model. Fails fast when the file is missing or the
    /// export does not carry the expected nine output tensors
    /// (score/box/keypoint triplets for strides 8, 16, 32; keypoints are
    /// ignored here).
    pub fn load(model_path: &Path) -> Result<Self, DetectError> {
        if !model_path.exists() {
            return Err(DetectError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path.to_string_lossy().as_ref())?;

        let num_outputs = session.outputs().len();
        if num_outputs < 9 {
            return Err(DetectError::Inference(format!(
                "SCRFD export must have 9 outputs (scores, boxes, keypoints per stride), got {num_outputs}"
            )));
        }

        tracing::info!(path = %model_path.display(), outputs = num_outputs, "SCRFD model loaded");

        Ok(Self { session })
    }

    /// Resize into the model square with aspect preserved, pad the borders
    /// with the normalization mean (which maps to 0.0), and replicate the
    /// single gray channel across the three input channels.
    fn preprocess(&self, image: &GrayImage) -> (Array4<f32>, Letterbox) {
        let (width, height) = image.dimensions();
        let scale = (INPUT_SIZE as f32 / width as f32).min(INPUT_SIZE as f32 / height as f32);
        let scaled_w = ((width as f32 * scale).round() as u32).max(1);
        let scaled_h = ((height as f32 * scale).round() as u32).max(1);

        let resized = imageops::resize(image, scaled_w, scaled_h, imageops::FilterType::Triangle);

        let pad_x = (INPUT_SIZE - scaled_w) / 2;
        let pad_y = (INPUT_SIZE - scaled_h) / 2;

        let side = INPUT_SIZE as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
        for y in 0..INPUT_SIZE {
            for x in 0..INPUT_SIZE {
                let inside = x >= pad_x && x < pad_x + scaled_w && y >= pad_y && y < pad_y + scaled_h;
                let pixel = if inside {
                    resized.get_pixel(x - pad_x, y - pad_y)[0] as f32
                } else {
                    PIXEL_MEAN
                };
                let value = (pixel - PIXEL_MEAN) / PIXEL_STD;
                for channel in 0..3 {
                    tensor[[0, channel, y as usize, x as usize]] = value;
                }
            }
        }

        (tensor, Letterbox { scale, pad_x, pad_y })
    }
}

impl FaceDetector for ScrfdDetector {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<FaceRegion>, DetectError> {
        let (input, letterbox) = self.preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        // Standard SCRFD export order: outputs 0-2 are scores for strides
        // 8/16/32, outputs 3-5 the matching box deltas.
        let mut candidates = Vec::new();
        for (position, &stride) in STRIDES.iter().enumerate() {
            let (_, scores) = outputs[position]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectError::Inference(format!("scores, stride {stride}: {e}")))?;
            let (_, deltas) = outputs[position + 3]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectError::Inference(format!("boxes, stride {stride}: {e}")))?;

            decode_stride(scores, deltas, stride, &letterbox, &mut candidates);
        }

        let kept = suppress(candidates, IOU_THRESHOLD);

        let (width, height) = image.dimensions();
        Ok(kept
            .into_iter()
            .filter_map(|c| to_region(&c, width, height))
            .collect())
    }
}

/// Decode one stride's anchor grid into image-space candidates.
fn decode_stride(
    scores: &[f32],
    deltas: &[f32],
    stride: u32,
    letterbox: &Letterbox,
    out: &mut Vec<Candidate>,
) {
    let grid = (INPUT_SIZE / stride) as usize;
    let anchors = grid * grid * ANCHORS_PER_CELL;

    for idx in 0..anchors {
        let score = match scores.get(idx) {
            Some(&s) if s > SCORE_THRESHOLD => s,
            _ => continue,
        };
        let offset = idx * 4;
        if offset + 3 >= deltas.len() {
            continue;
        }

        let cell = idx / ANCHORS_PER_CELL;
        let anchor_x = ((cell % grid) as u32 * stride) as f32;
        let anchor_y = ((cell / grid) as u32 * stride) as f32;

        // Box deltas are distances from the anchor center, in stride units.
        let s = stride as f32;
        let x1 = anchor_x - deltas[offset] * s;
        let y1 = anchor_y - deltas[offset + 1] * s;
        let x2 = anchor_x + deltas[offset + 2] * s;
        let y2 = anchor_y + deltas[offset + 3] * s;

        out.push(Candidate {
            x1: (x1 - letterbox.pad_x as f32) / letterbox.scale,
            y1: (y1 - letterbox.pad_y as f32) / letterbox.scale,
            x2: (x2 - letterbox.pad_x as f32) / letterbox.scale,
            y2: (y2 - letterbox.pad_y as f32) / letterbox.scale,
            score,
        });
    }
}

/// Greedy IoU suppression, best score first.
fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;

    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Clamp a candidate into image bounds; degenerate boxes are dropped.
fn to_region(candidate: &Candidate, width: u32, height: u32) -> Option<FaceRegion> {
    let x1 = candidate.x1.max(0.0).min(width as f32 - 1.0) as u32;
    let y1 = candidate.y1.max(0.0).min(height as f32 - 1.0) as u32;
    let x2 = candidate.x2.max(0.0).min(width as f32) as u32;
    let y2 = candidate.y2.max(0.0).min(height as f32) as u32;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(FaceRegion {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
        confidence: candidate.score,
    })
}
