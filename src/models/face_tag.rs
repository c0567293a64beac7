//! Face tag records: confirmed links between a crop file and a person

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A confirmed association between one cropped face image and one person.
///
/// `person_id` is nullable: a crop may be kept without an identification.
/// The backing file lives under the permanent media directory at `crop_path`
/// (media-root-relative).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceTag {
    pub id: Uuid,
    pub person_id: Option<Uuid>,
    /// Media-root-relative path of the permanent crop file.
    pub crop_path: String,
    /// Identifier of the remote file the crop was extracted from.
    pub source_file_id: String,
    pub created_at: DateTime<Utc>,
}

impl FaceTag {
    pub fn new(person_id: Option<Uuid>, crop_path: String, source_file_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_id,
            crop_path,
            source_file_id,
            created_at: Utc::now(),
        }
    }
}

/// Gallery row: a face tag joined to its person's display name.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedCrop {
    pub tag: FaceTag,
    /// None for unidentified crops or after the person row was removed
    /// out-of-band.
    pub person_name: Option<String>,
}
