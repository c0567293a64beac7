//! Shared test fixtures: fake detector, fake photo source, state builders
#![allow(dead_code)]

use async_trait::async_trait;
use heirloom::config::Config;
use heirloom::detect::{DetectError, FaceDetector, FaceRegion};
use heirloom::source::{PhotoSource, RemoteImage, SourceError};
use heirloom::tagging::{storage::CropStorage, Workflow};
use heirloom::AppState;
use image::GrayImage;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Detector returning a fixed set of regions for every image.
pub struct FakeDetector {
    pub regions: Vec<FaceRegion>,
}

impl FakeDetector {
    pub fn with_boxes(boxes: &[(u32, u32, u32, u32)]) -> Self {
        Self {
            regions: boxes
                .iter()
                .map(|&(x, y, width, height)| FaceRegion {
                    x,
                    y,
                    width,
                    height,
                    confidence: 0.9,
                })
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self { regions: Vec::new() }
    }
}

impl FaceDetector for FakeDetector {
    fn detect(&mut self, _image: &GrayImage) -> Result<Vec<FaceRegion>, DetectError> {
        Ok(self.regions.clone())
    }
}

/// In-memory photo source keyed by file id.
#[derive(Default)]
pub struct FakeSource {
    pub files: HashMap<String, Vec<u8>>,
    pub images: Vec<RemoteImage>,
}

impl FakeSource {
    pub fn with_file(file_id: &str, bytes: Vec<u8>) -> Self {
        let mut source = Self::default();
        source.files.insert(file_id.to_string(), bytes);
        source
    }
}

#[async_trait]
impl PhotoSource for FakeSource {
    async fn list_images(&self, _root_folder_id: &str) -> Result<Vec<RemoteImage>, SourceError> {
        Ok(self.images.clone())
    }

    async fn fetch_bytes(&self, file_id: &str) -> Result<Vec<u8>, SourceError> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| SourceError::Api(404, format!("no such file: {file_id}")))
    }
}

/// A solid-color PNG for decode-dependent tests.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 100, 90]));
    let mut cursor = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .expect("encode test png");
    cursor.into_inner()
}

pub fn test_config(media_root: &Path) -> Config {
    Config {
        media_root: media_root.to_path_buf(),
        database_path: media_root.join("test.db"),
        listen_port: 0,
        model_path: media_root.join("det_10g.onnx"),
        drive_folder_name: "Family Photos".to_string(),
        session_ttl_minutes: 30,
        oauth: None,
    }
}

/// Workflow over a temp media tree and an in-memory database.
pub async fn test_workflow() -> (TempDir, SqlitePool, Workflow) {
    test_workflow_with_ttl(30).await
}

pub async fn test_workflow_with_ttl(ttl_minutes: i64) -> (TempDir, SqlitePool, Workflow) {
    let dir = TempDir::new().expect("temp dir");
    let pool = heirloom::db::init_memory_pool()
        .await
        .expect("in-memory pool");

    let storage = CropStorage::new(dir.path().to_path_buf());
    storage.ensure_layout().expect("media layout");

    let workflow = Workflow::new(pool.clone(), storage, ttl_minutes);
    (dir, pool, workflow)
}

pub fn boxed_detector(detector: FakeDetector) -> Mutex<Box<dyn FaceDetector>> {
    Mutex::new(Box::new(detector))
}

/// Full application over fakes, for router tests.
pub async fn test_app() -> (TempDir, SqlitePool, axum::Router) {
    let dir = TempDir::new().expect("temp dir");
    let pool = heirloom::db::init_memory_pool()
        .await
        .expect("in-memory pool");

    let config = Arc::new(test_config(dir.path()));
    let state = AppState::new(pool.clone(), config, Box::new(FakeDetector::empty()));
    state
        .workflow
        .storage()
        .ensure_layout()
        .expect("media layout");

    let app = heirloom::build_router(state);
    (dir, pool, app)
}
