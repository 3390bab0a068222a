// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::ApiError, media::MediaError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Public HTTPS URL of the uploaded image.
    pub url: String,
}

/// Upload a listing image to the image host.
///
/// Expects a multipart form with the image in a `file` field.
#[utoipa::path(
    post,
    path = "/v1/uploads",
    tag = "Uploads",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded", body = UploadResponse),
        (status = 400, description = "No file field in the form"),
        (status = 502, description = "Image host rejected the upload"),
        (status = 503, description = "Uploads are not configured")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let media = state.media.clone().ok_or(MediaError::NotConfigured)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Could not read file: {e}")))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }
        let url = media
            .upload_image(&file_name, content_type.as_deref(), bytes.to_vec())
            .await?;
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::bad_request("Missing `file` field"))
}
