//! Face-tagging workflow
//!
//! Turns one remote image into zero or more persisted face tags through a
//! two-step, user-in-the-loop process:
//!
//! - **Analyze**: fetch the remote file, decode it, detect faces on the
//!   grayscale conversion, crop each region from the color image into a
//!   per-session scratch arena, and offer the crops alongside the person
//!   registry for selection.
//! - **Commit**: for the picks the user confirmed, move each crop into
//!   permanent storage and record the association.
//!
//! Each analysis gets its own token-keyed scratch arena; a commit against an
//! unknown or expired token fails explicitly instead of silently matching
//! nothing. Expired arenas are swept inline at the start of each analysis;
//! there are no background tasks.

pub mod storage;

use crate::db;
use crate::detect::{DetectError, FaceDetector};
use crate::models::{FaceTag, Person};
use crate::source::{PhotoSource, SourceError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use storage::CropStorage;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("image could not be decoded: {0}")]
    Decode(String),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("scratch storage failure: {0}")]
    Storage(#[from] std::io::Error),
    #[error("crop write failed: {0}")]
    CropWrite(String),
    #[error("no analysis in progress for token {0}")]
    UnknownSession(Uuid),
    #[error("person not found: {0}")]
    PersonNotFound(Uuid),
    #[error("face tag not found: {0}")]
    TagNotFound(Uuid),
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// One analysis pass awaiting commit.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub token: Uuid,
    /// Remote file the crops were extracted from; threaded through to the
    /// committed records.
    pub source_file_id: String,
    pub crop_count: usize,
    pub created_at: DateTime<Utc>,
}

/// One crop offered for identification.
#[derive(Debug, Clone, Serialize)]
pub struct CropOffer {
    pub index: usize,
    /// Media-root-relative path, servable under the media route.
    pub media_path: String,
}

/// Presentation payload for the analyze page.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOutcome {
    pub token: Uuid,
    pub source_file_id: String,
    pub crops: Vec<CropOffer>,
    pub persons: Vec<Person>,
}

/// One user decision: crop index plus the chosen person, if any.
#[derive(Debug, Clone, Deserialize)]
pub struct FacePick {
    pub index: usize,
    pub person_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommitOutcome {
    pub created: usize,
    pub skipped: usize,
}

pub struct Workflow {
    db: SqlitePool,
    storage: CropStorage,
    sessions: RwLock<HashMap<Uuid, AnalysisSession>>,
    session_ttl: Duration,
}

impl Workflow {
    pub fn new(db: SqlitePool, storage: CropStorage, session_ttl_minutes: i64) -> Self {
        Self {
            db,
            storage,
            sessions: RwLock::new(HashMap::new()),
            session_ttl: Duration::minutes(session_ttl_minutes),
        }
    }

    pub fn storage(&self) -> &CropStorage {
        &self.storage
    }

    /// Step A: fetch, decode, detect, crop, and offer.
    ///
    /// Zero detected faces is a valid outcome (empty crop list). A failed
    /// crop write fails the whole analysis and leaves no arena behind.
    pub async fn analyze(
        &self,
        source: &dyn PhotoSource,
        detector: &Mutex<Box<dyn FaceDetector>>,
        file_id: &str,
    ) -> Result<AnalyzeOutcome, WorkflowError> {
        self.sweep_expired().await;

        let bytes = source.fetch_bytes(file_id).await?;
        tracing::debug!(file_id, bytes = bytes.len(), "fetched remote image");

        let photo =
            image::load_from_memory(&bytes).map_err(|e| WorkflowError::Decode(e.to_string()))?;
        let gray = photo.to_luma8();

        let regions = {
            let mut detector = detector.lock().await;
            detector.detect(&gray)?
        };
        tracing::info!(file_id, faces = regions.len(), "face detection complete");

        let token = Uuid::new_v4();
        let arena = self.storage.create_session_dir(token)?;

        let mut crops = Vec::with_capacity(regions.len());
        for (index, region) in regions.iter().enumerate() {
            let crop = photo
                .crop_imm(region.x, region.y, region.width, region.height)
                .to_rgb8();
            let path = arena.join(CropStorage::crop_file_name(index));
            if let Err(e) = crop.save(&path) {
                // Fail the whole pass rather than offering a partial set.
                self.storage.remove_session_dir(token);
                return Err(WorkflowError::CropWrite(e.to_string()));
            }
            crops.push(CropOffer {
                index,
                media_path: self.storage.scratch_crop_path(token, index),
            });
        }

        let persons = db::persons::list_persons(&self.db).await?;

        let session = AnalysisSession {
            token,
            source_file_id: file_id.to_string(),
            crop_count: crops.len(),
            created_at: Utc::now(),
        };
        self.sessions.write().await.insert(token, session);

        Ok(AnalyzeOutcome {
            token,
            source_file_id: file_id.to_string(),
            crops,
            persons,
        })
    }

    /// Step B: persist the confirmed picks.
    ///
    /// Picks without a person are skipped, as are picks whose scratch file
    /// has gone missing. A pick naming an unknown person aborts the commit
    /// (earlier picks in the same request stay committed). On success the
    /// session and its arena are discarded.
    pub async fn commit(
        &self,
        token: Uuid,
        picks: &[FacePick],
    ) -> Result<CommitOutcome, WorkflowError> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .get(&token)
                .filter(|s| !self.is_expired(s))
                .cloned()
                .ok_or(WorkflowError::UnknownSession(token))?
        };

        let mut created = 0;
        let mut skipped = 0;

        for pick in picks {
            let Some(person_id) = pick.person_id else {
                skipped += 1;
                continue;
            };

            let person = db::persons::load_person(&self.db, person_id)
                .await?
                .ok_or(WorkflowError::PersonNotFound(person_id))?;

            let permanent_name = CropStorage::permanent_file_name(&person.given_name, pick.index);
            let Some(relative_path) = self.storage.promote(token, pick.index, &permanent_name)?
            else {
                // Scratch file missing: skip silently, no record.
                skipped += 1;
                continue;
            };

            let tag = FaceTag::new(
                Some(person.id),
                relative_path.clone(),
                session.source_file_id.clone(),
            );
            if let Err(e) = db::face_tags::save_face_tag(&self.db, &tag).await {
                // Compensate: the file moved but the record did not land.
                self.storage.remove_permanent(&relative_path);
                return Err(e.into());
            }

            tracing::info!(
                person = %person.display_name(),
                crop = %relative_path,
                source = %session.source_file_id,
                "face tag created"
            );
            created += 1;
        }

        self.sessions.write().await.remove(&token);
        self.storage.remove_session_dir(token);

        Ok(CommitOutcome { created, skipped })
    }

    /// Delete one confirmed tag: remove the backing file if present (a
    /// missing file is fine), then the record. Sequential and
    /// non-transactional.
    pub async fn delete_tag(&self, id: Uuid) -> Result<(), WorkflowError> {
        let tag = db::face_tags::load_face_tag(&self.db, id)
            .await?
            .ok_or(WorkflowError::TagNotFound(id))?;

        self.storage.remove_permanent(&tag.crop_path);

        db::face_tags::delete_face_tag(&self.db, id).await?;
        tracing::info!(tag = %id, crop = %tag.crop_path, "face tag deleted");
        Ok(())
    }

    /// Remove permanent crops that no record references: leftovers from a
    /// crash between file move and record insert. Run at startup.
    pub async fn reconcile(&self) -> Result<usize, WorkflowError> {
        let referenced: HashSet<String> = db::face_tags::list_crop_paths(&self.db)
            .await?
            .into_iter()
            .collect();
        let removed = self.storage.reconcile(&referenced)?;
        if removed > 0 {
            tracing::warn!(removed, "reconciliation removed orphaned crops");
        }
        Ok(removed)
    }

    fn is_expired(&self, session: &AnalysisSession) -> bool {
        Utc::now() - session.created_at > self.session_ttl
    }

    /// Drop expired sessions and any scratch arena without a live session.
    async fn sweep_expired(&self) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| !self.is_expired(session));
        let live: HashSet<Uuid> = sessions.keys().copied().collect();
        self.storage.sweep_scratch(&live);
    }
}
