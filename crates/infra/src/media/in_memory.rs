use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{HostedMedia, MediaError, MediaHost, UploadOptions};

/// A recorded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub options: UploadOptions,
    pub size: u64,
}

/// Media host for dev/tests: nothing leaves the process.
///
/// Returns `memory://{folder}/{file_name}`. Every attempt is recorded, including
/// ones a failing host rejects after reading the file.
#[derive(Debug, Default)]
pub struct InMemoryMediaHost {
    uploads: Mutex<Vec<RecordedUpload>>,
    fail: bool,
}

impl InMemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl MediaHost for InMemoryMediaHost {
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<HostedMedia, MediaError> {
        let size = tokio::fs::metadata(path).await?.len();

        self.uploads
            .lock()
            .map_err(|_| MediaError::Transport("upload log lock poisoned".to_string()))?
            .push(RecordedUpload {
                path: path.to_path_buf(),
                options: options.clone(),
                size,
            });

        if self.fail {
            return Err(MediaError::Rejected {
                status: 503,
                body: "media host disabled".to_string(),
            });
        }

        Ok(HostedMedia {
            secure_url: format!("memory://{}/{}", options.folder, options.file_name),
            public_id: Some(format!("{}/{}", options.folder, options.file_name)),
        })
    }
}
