//! Remote photo source
//!
//! The tagging workflow depends on the [`PhotoSource`] trait; the production
//! implementation is the Google Drive client in [`drive`], authorized by the
//! redirect flow in [`oauth`].

pub mod drive;
pub mod oauth;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("provider error {0}: {1}")]
    Api(u16, String),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
}

/// One remote image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub id: String,
    pub name: String,
}

/// Read access to the remote photo store.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// List image files under the given folder, recursing into sub-folders
    /// without a depth bound. Remote folder structures are assumed acyclic.
    async fn list_images(&self, root_folder_id: &str) -> Result<Vec<RemoteImage>, SourceError>;

    /// Full byte content of one remote file.
    async fn fetch_bytes(&self, file_id: &str) -> Result<Vec<u8>, SourceError>;
}
