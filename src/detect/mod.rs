//! Face detection seam
//!
//! The tagging workflow only sees the [`FaceDetector`] trait: grayscale image
//! in, rectangular face regions out, in whatever order the backing model
//! yields them. The production implementation is [`scrfd::ScrfdDetector`];
//! tests substitute a deterministic fake.

pub mod scrfd;

use image::GrayImage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("model file not found: {0} (download det_10g.onnx from insightface and place it there)")]
    ModelNotFound(PathBuf),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Axis-aligned face region in pixel coordinates of the analyzed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

/// Black-box face classifier: returns bounding boxes for detected faces.
///
/// Detection runs on a grayscale conversion; cropping happens later on the
/// original color image using the returned coordinates.
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<FaceRegion>, DetectError>;
}
