// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Data directory availability (if configured).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Ledger node reachability.
    pub algod: String,
    /// Latest round reported by the node, when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_round: Option<u64>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check_data_dir(state: &AppState) -> Option<String> {
    state.data_dir.as_ref().map(|dir| {
        if dir.exists() {
            "ok".to_string()
        } else {
            "missing".to_string()
        }
    })
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails. The document
/// store is not probed; its outages surface on the calls that need it.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let data_dir = check_data_dir(&state);
    let last_round = state.chain.last_round().await.ok();

    let data_ok = data_dir.as_ref().map(|s| s == "ok").unwrap_or(true);
    let algod_ok = last_round.is_some();
    let all_ok = data_ok && algod_ok;

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            data_dir,
            algod: if algod_ok { "ok" } else { "unavailable" }.to_string(),
            last_round,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::{FakeAlgod, FakeWallet, TestApp};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_reports_node_round() {
        let app = TestApp::new(FakeAlgod::new(), FakeWallet::default());
        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["algod"], "ok");
        assert_eq!(body["checks"]["data_dir"], "ok");
        assert_eq!(body["checks"]["last_round"], 40_000);
    }

    #[tokio::test]
    async fn liveness_always_ok() {
        let app = TestApp::new(FakeAlgod::new(), FakeWallet::default());
        let (status, body) = app.get("/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
