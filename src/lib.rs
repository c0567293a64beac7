//! heirloom: family photo face tagging
//!
//! Organizes photos kept in Google Drive, runs a face-detection pass over a
//! chosen photo, and lets the user tag detected face crops with family
//! members stored in a local SQLite database. Library interface exists for
//! integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod models;
pub mod source;
pub mod tagging;

pub use crate::error::{ApiError, ApiResult};

use crate::config::Config;
use crate::detect::FaceDetector;
use crate::source::oauth::DriveCredentials;
use crate::tagging::{storage::CropStorage, Workflow};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::services::ServeDir;

/// Application state shared across handlers.
///
/// Built for a single trusted user: the drive credential and the pending
/// OAuth state live directly in process state rather than a session store.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub detector: Arc<Mutex<Box<dyn FaceDetector>>>,
    pub credentials: Arc<RwLock<Option<DriveCredentials>>>,
    /// CSRF state for the in-flight authorization redirect.
    pub pending_oauth_state: Arc<RwLock<Option<String>>>,
    pub workflow: Arc<Workflow>,
    pub startup_time: DateTime<Utc>,
}

/// Client-level bound on every remote call; there are no retries.
const REMOTE_TIMEOUT_SECS: u64 = 30;

impl AppState {
    pub fn new(db: SqlitePool, config: Arc<Config>, detector: Box<dyn FaceDetector>) -> Self {
        let storage = CropStorage::new(config.media_root.clone());
        let workflow = Workflow::new(db.clone(), storage, config.session_ttl_minutes);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .build()
            .expect("failed to build http client");

        Self {
            db,
            config,
            http,
            detector: Arc::new(Mutex::new(detector)),
            credentials: Arc::new(RwLock::new(None)),
            pending_oauth_state: Arc::new(RwLock::new(None)),
            workflow: Arc::new(workflow),
            startup_time: Utc::now(),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let media_root = state.config.media_root.clone();

    Router::new()
        .merge(api::home::routes())
        .merge(api::auth::routes())
        .merge(api::photos::routes())
        .merge(api::tagging::routes())
        .merge(api::gallery::routes())
        .merge(api::persons::routes())
        .merge(api::health::routes())
        .nest_service("/media", ServeDir::new(media_root))
        .with_state(state)
}
