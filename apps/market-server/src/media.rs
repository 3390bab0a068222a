// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Listing image uploads to Cloudinary.
//!
//! Uploads are unsigned: the multipart form carries the file and an upload
//! preset configured on the Cloudinary account, and the response's
//! `secure_url` becomes the item's image URL.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::CloudinaryConfig;

pub const CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";

/// Largest image accepted for upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Image uploads are not configured")]
    NotConfigured,

    #[error("Upload request failed: {0}")]
    Request(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    upload_url: String,
    upload_preset: String,
    http: Client,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, MediaError> {
        Self::with_base_url(CLOUDINARY_API_URL, config)
    }

    pub fn with_base_url(base_url: &str, config: &CloudinaryConfig) -> Result<Self, MediaError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| MediaError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            upload_url: format!(
                "{}/{}/image/upload",
                base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            upload_preset: config.upload_preset.clone(),
            http,
        })
    }

    /// Upload one image and return its public HTTPS URL.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, MediaError> {
        let size = bytes.len();
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = content_type {
            part = part
                .mime_str(mime)
                .map_err(|e| MediaError::Request(format!("bad content type: {e}")))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        let url = parse_upload_response(&body).inspect_err(|e| {
            warn!(error = %e, "Cloudinary rejected upload");
        })?;
        info!(file_name, size, url = %url, "Image uploaded");
        Ok(url)
    }
}

/// Extract `secure_url` from an upload response, or the error message
/// Cloudinary returned instead.
pub fn parse_upload_response(body: &Value) -> Result<String, MediaError> {
    if let Some(url) = body.get("secure_url").and_then(Value::as_str) {
        return Ok(url.to_string());
    }
    match body.pointer("/error/message").and_then(Value::as_str) {
        Some(message) => Err(MediaError::Rejected(message.to_string())),
        None => Err(MediaError::InvalidResponse(format!(
            "no secure_url in response: {body}"
        ))),
    }
}
