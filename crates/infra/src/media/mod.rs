//! Media host adapter: pushes a local image file to a hosting service and returns
//! the public URL.

use std::path::Path;

use thiserror::Error;

pub mod cloudinary;
pub mod in_memory;

pub use cloudinary::CloudinaryClient;
pub use in_memory::InMemoryMediaHost;

/// Per-upload options forwarded to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    /// Original client file name, used as the public id when `use_filename` is set.
    pub file_name: String,
    pub use_filename: bool,
    pub unique_filename: bool,
}

impl UploadOptions {
    /// Keep the client's file name, without a uniqueness suffix.
    pub fn named(folder: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            file_name: file_name.into(),
            use_filename: true,
            unique_filename: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMedia {
    pub secure_url: String,
    pub public_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("media host unreachable: {0}")]
    Transport(String),

    #[error("media host rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected media host response: {0}")]
    MalformedResponse(String),
}

#[async_trait::async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<HostedMedia, MediaError>;
}
