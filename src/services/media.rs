// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media store client (Cloudinary-style REST API).
//!
//! Handles:
//! - Signed binary uploads (auto resource type)
//! - Asset deletion by public ID
//! - Metadata lookup via the admin API

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::AppError;
use crate::services::signer::unix_now;

/// A stored media asset: fetchable URL, store identifier, and the
/// duration the store reports for video content.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
    pub duration_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
}

/// Asset metadata from the admin API.
#[derive(Debug, Deserialize)]
pub struct MediaMetadata {
    pub public_id: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Media store client.
///
/// `new_mock()` builds an offline client that fabricates deterministic
/// assets, so upload flows are testable without network access.
#[derive(Clone)]
pub struct MediaService {
    http: Option<reqwest::Client>,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl MediaService {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Some(reqwest::Client::new()),
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name: config.media_cloud_name.clone(),
            api_key: config.media_api_key.clone(),
            api_secret: config.media_api_secret.clone(),
        }
    }

    /// Create an offline media client for testing.
    pub fn new_mock() -> Self {
        Self {
            http: None,
            base_url: "https://media.invalid/v1_1".to_string(),
            cloud_name: "mock".to_string(),
            api_key: "mock".to_string(),
            api_secret: "mock".to_string(),
        }
    }

    /// Upload a file's bytes; the store assigns the public ID.
    ///
    /// Returns the asset reference, or a [`AppError::Media`] failure the
    /// caller maps to its own taxonomy.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<MediaAsset, AppError> {
        let Some(http) = &self.http else {
            // Offline mode: fabricate a stable-looking asset.
            let public_id = format!("vidstream/{}", uuid::Uuid::new_v4());
            return Ok(MediaAsset {
                url: format!("{}/{}/{}", self.base_url, self.cloud_name, public_id),
                public_id,
                duration_seconds: 0.0,
            });
        };

        let timestamp = unix_now().to_string();
        let signature = self.sign(&[("timestamp", &timestamp)]);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!("{}/{}/auto/upload", self.base_url, self.cloud_name);
        let response = http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Media(e.to_string()))?;

        let response = Self::check_response(response).await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Media(format!("invalid upload response: {}", e)))?;

        tracing::info!(public_id = %uploaded.public_id, "Media uploaded");

        Ok(MediaAsset {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            duration_seconds: uploaded.duration.unwrap_or(0.0),
        })
    }

    /// Delete an asset by its store identifier.
    pub async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        let Some(http) = &self.http else {
            return Ok(());
        };

        let timestamp = unix_now().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let url = format!("{}/{}/image/destroy", self.base_url, self.cloud_name);
        let response = http
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("api_key", &self.api_key),
                ("timestamp", &timestamp),
                ("signature", &signature),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Media(e.to_string()))?;

        Self::check_response(response).await?;
        tracing::info!(public_id, "Media deleted");
        Ok(())
    }

    /// Fetch asset metadata from the admin API.
    pub async fn metadata(&self, public_id: &str) -> Result<MediaMetadata, AppError> {
        let Some(http) = &self.http else {
            return Ok(MediaMetadata {
                public_id: public_id.to_string(),
                format: None,
                bytes: 0,
                duration: None,
            });
        };

        let url = format!(
            "{}/{}/resources/video/upload/{}",
            self.base_url, self.cloud_name, public_id
        );
        let response = http
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| AppError::Media(e.to_string()))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Media(format!("invalid metadata response: {}", e)))
    }

    /// SHA-256 request signature over the sorted parameter string.
    ///
    /// `params` must already be sorted by key; the secret is appended to
    /// the `key=value&...` serialization.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let serialized = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Media store request failed");
        Err(AppError::Media(format!("media store returned {}", status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let media = MediaService::new_mock();
        let a = media.sign(&[("public_id", "vidstream/x"), ("timestamp", "1700000000")]);
        let b = media.sign(&[("public_id", "vidstream/x"), ("timestamp", "1700000000")]);

        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_signature_depends_on_params() {
        let media = MediaService::new_mock();
        let a = media.sign(&[("timestamp", "1700000000")]);
        let b = media.sign(&[("timestamp", "1700000001")]);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_mock_upload_returns_unique_assets() {
        let media = MediaService::new_mock();
        let a = media.upload(vec![1, 2, 3], "a.png").await.unwrap();
        let b = media.upload(vec![1, 2, 3], "b.png").await.unwrap();

        assert_ne!(a.public_id, b.public_id);
        assert!(a.url.contains(&a.public_id));
    }
}
