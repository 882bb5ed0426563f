use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod google_drive;

pub use google_drive::{GoogleDriveClient, ServiceAccountKey};

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Drive API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("File not found on Drive")]
    NotFound,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected Drive response: {0}")]
    Decode(String),
}

/// A file to place in the remote store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    pub parent_folder: String,
    pub description: Option<String>,
    /// Extra text the provider indexes for its own search
    pub indexable_text: Option<String>,
    pub mime_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub id: String,
    pub view_link: String,
    pub content_link: Option<String>,
}

#[async_trait]
pub trait DriveProvider: Send + Sync {
    /// Provider identifier (e.g., "google_drive")
    fn provider_id(&self) -> &'static str;

    async fn upload(&self, request: UploadRequest) -> Result<RemoteFile, DriveError>;

    /// Make the file readable by anyone holding the link
    async fn set_public_read_permission(&self, file_id: &str) -> Result<(), DriveError>;

    /// Remove the file. A missing file is reported as [`DriveError::NotFound`].
    async fn delete(&self, file_id: &str) -> Result<(), DriveError>;
}
