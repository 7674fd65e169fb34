//! Cloudinary upload API client (signed uploads).

use std::path::Path;

use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use super::{HostedMedia, MediaError, MediaHost, UploadOptions};
use crate::config::CloudinaryConfig;

#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: String,
    #[serde(default)]
    public_id: Option<String>,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.base_url, self.config.cloud_name
        )
    }
}

/// Parameters covered by the request signature, sorted by key.
fn signed_params(options: &UploadOptions, timestamp: i64) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("folder", options.folder.clone()),
        ("timestamp", timestamp.to_string()),
        ("unique_filename", options.unique_filename.to_string()),
        ("use_filename", options.use_filename.to_string()),
    ];
    params.sort_by_key(|(k, _)| *k);
    params
}

/// `sha256_hex("k1=v1&k2=v2..." + api_secret)`.
fn sign(params: &[(&'static str, String)], api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait::async_trait]
impl MediaHost for CloudinaryClient {
    #[instrument(skip(self, path), fields(folder = %options.folder, file_name = %options.file_name), err)]
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<HostedMedia, MediaError> {
        let data = tokio::fs::read(path).await?;

        let params = signed_params(options, Utc::now().timestamp());
        let signature = sign(&params, &self.config.api_secret);

        let part = Part::bytes(data).file_name(options.file_name.clone());
        let mut form = Form::new().part("file", part);
        for (key, value) in params {
            form = form.text(key, value);
        }
        let form = form
            .text("api_key", self.config.api_key.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let resp = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: UploadReply = resp
            .json()
            .await
            .map_err(|e| MediaError::MalformedResponse(e.to_string()))?;

        tracing::info!(public_id = ?reply.public_id, "image uploaded");
        Ok(HostedMedia {
            secure_url: reply.secure_url,
            public_id: reply.public_id,
        })
    }
}
