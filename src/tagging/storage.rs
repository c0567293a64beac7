//! Crop file storage
//!
//! The media root holds two trees: `scratch/<token>/` arenas with crops
//! awaiting confirmation (one arena per analysis pass), and `permanent/`
//! with confirmed crops. Promotion is a rename, so both trees must live on
//! the same filesystem.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SCRATCH_DIR: &str = "scratch";
pub const PERMANENT_DIR: &str = "permanent";

/// Replace filesystem-hostile characters in a person's name so the
/// permanent filename cannot escape the permanent directory.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "person".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct CropStorage {
    media_root: PathBuf,
}

impl CropStorage {
    pub fn new(media_root: PathBuf) -> Self {
        Self { media_root }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.media_root.join(SCRATCH_DIR)
    }

    pub fn permanent_root(&self) -> PathBuf {
        self.media_root.join(PERMANENT_DIR)
    }

    /// Create the scratch and permanent trees if missing.
    pub fn ensure_layout(&self) -> io::Result<()> {
        fs::create_dir_all(self.scratch_root())?;
        fs::create_dir_all(self.permanent_root())?;
        Ok(())
    }

    /// Scratch arena for one analysis session.
    pub fn session_dir(&self, token: Uuid) -> PathBuf {
        self.scratch_root().join(token.to_string())
    }

    /// Fresh arena for a new analysis. Any leftover directory under the same
    /// token is discarded first.
    pub fn create_session_dir(&self, token: Uuid) -> io::Result<PathBuf> {
        let dir = self.session_dir(token);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Best-effort removal of a session arena.
    pub fn remove_session_dir(&self, token: Uuid) {
        let dir = self.session_dir(token);
        if let Err(e) = fs::remove_dir_all(&dir) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(token = %token, error = %e, "could not remove scratch arena");
            }
        }
    }

    /// File name of the crop at a given detection index.
    pub fn crop_file_name(index: usize) -> String {
        format!("face_{index}.jpg")
    }

    /// Media-root-relative path of a scratch crop, for serving in pages.
    pub fn scratch_crop_path(&self, token: Uuid, index: usize) -> String {
        format!("{SCRATCH_DIR}/{token}/{}", Self::crop_file_name(index))
    }

    /// Permanent file name for a confirmed crop.
    pub fn permanent_file_name(given_name: &str, index: usize) -> String {
        format!("{}_{}", sanitize_name(given_name), Self::crop_file_name(index))
    }

    /// Move a scratch crop into permanent storage. Returns the
    /// media-root-relative permanent path, or `None` when the scratch file
    /// does not exist (the caller skips the crop silently).
    pub fn promote(
        &self,
        token: Uuid,
        index: usize,
        permanent_name: &str,
    ) -> io::Result<Option<String>> {
        let scratch = self.session_dir(token).join(Self::crop_file_name(index));
        if !scratch.exists() {
            return Ok(None);
        }

        let destination = self.permanent_root().join(permanent_name);
        fs::rename(&scratch, &destination)?;
        Ok(Some(format!("{PERMANENT_DIR}/{permanent_name}")))
    }

    /// Best-effort removal of a permanent crop by its media-root-relative
    /// path. A missing file is not an error.
    pub fn remove_permanent(&self, relative_path: &str) {
        let path = self.media_root.join(relative_path);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "could not remove crop file");
            }
        }
    }

    /// Delete permanent crops that no record references. Returns the number
    /// of orphans removed.
    pub fn reconcile(&self, referenced: &HashSet<String>) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(self.permanent_root())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let relative = format!("{PERMANENT_DIR}/{}", entry.file_name().to_string_lossy());
            if !referenced.contains(&relative) {
                fs::remove_file(entry.path())?;
                removed += 1;
                tracing::info!(path = %relative, "removed orphaned crop");
            }
        }
        Ok(removed)
    }

    /// Remove scratch arenas whose token is not in the live set. Covers
    /// arenas left behind by failed analyses and expired sessions.
    pub fn sweep_scratch(&self, live_tokens: &HashSet<Uuid>) {
        let entries = match fs::read_dir(self.scratch_root()) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let keep = name
                .to_str()
                .and_then(|n| Uuid::parse_str(n).ok())
                .map(|token| live_tokens.contains(&token))
                .unwrap_or(false);
            if !keep {
                if let Err(e) = fs::remove_dir_all(entry.path()) {
                    tracing::warn!(error = %e, "could not sweep scratch entry");
                }
            }
        }
    }
}
