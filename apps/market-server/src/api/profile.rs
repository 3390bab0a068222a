// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use tracing::info;

use super::connected_address;
use crate::{
    error::ApiError,
    models::{Profile, ProfileFields},
    state::AppState,
};

/// The connected wallet's profile. A wallet without one gets empty fields.
#[utoipa::path(
    get,
    path = "/v1/profile",
    tag = "Profile",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 401, description = "Wallet not connected")
    )
)]
pub async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    let address = connected_address(&state).await?;
    let profile = state
        .store
        .get_profile(address.as_str())
        .await?
        .unwrap_or_else(|| Profile {
            address: address.to_string(),
            name: String::new(),
            roll_no: String::new(),
            phone: String::new(),
            pickup_location: String::new(),
            updated_at: None,
        });
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/v1/profile",
    tag = "Profile",
    request_body = ProfileFields,
    responses(
        (status = 200, description = "Profile saved", body = Profile),
        (status = 400, description = "Name or roll number missing"),
        (status = 401, description = "Wallet not connected")
    )
)]
pub async fn save_profile(
    State(state): State<AppState>,
    Json(fields): Json<ProfileFields>,
) -> Result<Json<Profile>, ApiError> {
    let address = connected_address(&state).await?;
    if !fields.is_complete() {
        return Err(ApiError::bad_request(
            "Please fill in at least your name and roll number.",
        ));
    }
    let profile = state.store.save_profile(address.as_str(), fields).await?;
    info!(address = %address.short(), "Profile saved");
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::testing::{FakeAlgod, TestApp, BUYER};

    #[tokio::test]
    async fn missing_profile_is_blank() {
        let app = TestApp::connected_as(BUYER, FakeAlgod::new()).await;
        let (status, body) = app.get("/v1/profile").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], BUYER);
        assert_eq!(body["name"], "");
    }

    #[tokio::test]
    async fn save_then_read_back() {
        let app = TestApp::connected_as(BUYER, FakeAlgod::new()).await;
        let (status, _) = app
            .send(
                Method::PUT,
                "/v1/profile",
                Some(json!({"name": "Kiran", "rollNo": "  "})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(
                Method::PUT,
                "/v1/profile",
                Some(json!({"name": "Kiran", "rollNo": "23EE042", "phone": "90000"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rollNo"], "23EE042");

        let (_, body) = app.get("/v1/profile").await;
        assert_eq!(body["phone"], "90000");
    }
}
