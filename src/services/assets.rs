// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avatar image uploads to the asset host.

use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier and version of an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub public_id: String,
    pub version: String,
}

/// Uploads a base64 (data URI) image under a chosen public id.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        file: &str,
        public_id: &str,
        overwrite: bool,
        invalidate: bool,
    ) -> Result<UploadResult>;
}

/// Cloudinary upload API client.
pub struct CloudinaryUploader {
    http_client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: Option<String>,
    version: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorResponse {
    error: UploadErrorMessage,
}

#[derive(Debug, Deserialize)]
struct UploadErrorMessage {
    message: String,
}

impl CloudinaryUploader {
    /// Build from configuration; `None` unless all three credentials are set.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            http_client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone()?,
            api_key: config.cloud_api_key.clone()?,
            api_secret: config.cloud_api_secret.clone()?,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }
}

/// Hex SHA-256 signature over the sorted signed parameters followed by the secret.
pub fn sign_upload_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AssetUploader for CloudinaryUploader {
    async fn upload(
        &self,
        file: &str,
        public_id: &str,
        overwrite: bool,
        invalidate: bool,
    ) -> Result<UploadResult> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs();

        let mut params = vec![
            ("invalidate", invalidate.to_string()),
            ("overwrite", overwrite.to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = sign_upload_params(&params, &self.api_secret);

        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params.push(("file", file.to_string()));

        let response = self
            .http_client
            .post(self.upload_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<UploadErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(AppError::Upload(format!("{}: {}", status, message)));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        match (body.public_id, body.version) {
            (Some(public_id), Some(version)) if !public_id.is_empty() => {
                tracing::debug!(public_id = %public_id, version, "Uploaded asset");
                Ok(UploadResult {
                    public_id,
                    version: version.to_string(),
                })
            }
            _ => Err(AppError::Upload(
                "Upload response has no public_id".to_string(),
            )),
        }
    }
}

/// Uploader used when no asset host is configured. Every upload fails.
pub struct DisabledUploader;

#[async_trait]
impl AssetUploader for DisabledUploader {
    async fn upload(
        &self,
        _file: &str,
        public_id: &str,
        _overwrite: bool,
        _invalidate: bool,
    ) -> Result<UploadResult> {
        tracing::warn!(public_id, "Asset upload attempted without asset host credentials");
        Err(AppError::Upload("Asset host is not configured".to_string()))
    }
}
