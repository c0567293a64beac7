//! Google Drive v3 client
//!
//! Thin REST wrapper over the handful of Drive calls the application needs:
//! folder queries, recursive image listing, media download, and the one-time
//! "organize" pass that gathers loose top-level images into the well-known
//! root folder. No retries; a single client-level timeout bounds each call.

use super::{oauth::DriveCredentials, PhotoSource, RemoteImage, SourceError};
use async_trait::async_trait;
use serde::Deserialize;

const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, parents)";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Drive query for everything inside a folder.
fn children_query(folder_id: &str) -> String {
    format!("'{folder_id}' in parents and trashed = false")
}

/// Drive query for a folder with the given name.
fn folder_by_name_query(name: &str) -> String {
    // Drive query strings escape single quotes with a backslash.
    let escaped = name.replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{FOLDER_MIME_TYPE}' and trashed = false")
}

/// Drive query for loose images directly under the drive root.
fn loose_images_query() -> String {
    "mimeType contains 'image/' and 'root' in parents and trashed = false".to_string()
}

pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, credentials: &DriveCredentials) -> Self {
        Self {
            http,
            access_token: credentials.access_token.clone(),
            base_url: DRIVE_BASE_URL.to_string(),
        }
    }

    /// One page of a files.list call.
    async fn list_page(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FileList, SourceError> {
        let mut request = self
            .http
            .get(format!("{}/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("q", query), ("fields", LIST_FIELDS)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }

    /// All files matching a query, following pagination.
    async fn list_all(&self, query: &str) -> Result<Vec<DriveFile>, SourceError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(query, page_token.as_deref()).await?;
            files.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(files)
    }

    /// Locate the well-known root folder by name.
    pub async fn find_folder(&self, name: &str) -> Result<Option<String>, SourceError> {
        let folders = self.list_all(&folder_by_name_query(name)).await?;
        Ok(folders.into_iter().next().map(|f| f.id))
    }

    /// Create a folder at the drive root.
    pub async fn create_folder(&self, name: &str) -> Result<String, SourceError> {
        let response = self
            .http
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id")])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        let created: DriveFile = response.json().await?;
        Ok(created.id)
    }

    /// Re-parent a file into the given folder.
    async fn move_file(
        &self,
        file_id: &str,
        new_parent: &str,
        old_parents: &[String],
    ) -> Result<(), SourceError> {
        let response = self
            .http
            .patch(format!("{}/files/{file_id}", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[
                ("addParents", new_parent),
                ("removeParents", old_parents.join(",").as_str()),
                ("fields", "id, parents"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        Ok(())
    }

    /// One-time setup: find or create the root folder, then sweep loose
    /// top-level images into it. Returns the folder id.
    pub async fn ensure_organized(&self, folder_name: &str) -> Result<String, SourceError> {
        let folder_id = match self.find_folder(folder_name).await? {
            Some(id) => id,
            None => {
                tracing::info!(folder = folder_name, "creating drive root folder");
                self.create_folder(folder_name).await?
            }
        };

        let loose = self.list_all(&loose_images_query()).await?;
        let moved = loose.len();
        for file in loose {
            self.move_file(&file.id, &folder_id, &file.parents).await?;
        }
        if moved > 0 {
            tracing::info!(moved, folder = folder_name, "gathered loose images");
        }

        Ok(folder_id)
    }
}

#[async_trait]
impl PhotoSource for DriveClient {
    async fn list_images(&self, root_folder_id: &str) -> Result<Vec<RemoteImage>, SourceError> {
        let mut pending = vec![root_folder_id.to_string()];
        let mut images = Vec::new();

        while let Some(folder_id) = pending.pop() {
            for file in self.list_all(&children_query(&folder_id)).await? {
                if file.mime_type == FOLDER_MIME_TYPE {
                    pending.push(file.id);
                } else if file.mime_type.starts_with("image/") {
                    images.push(RemoteImage {
                        id: file.id,
                        name: file.name,
                    });
                }
            }
        }

        Ok(images)
    }

    async fn fetch_bytes(&self, file_id: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .http
            .get(format!("{}/files/{file_id}", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
