// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session endpoints.
//!
//! Connect and disconnect replace the shared session with the value the
//! [`WalletSession`] operations return; a failed connect leaves it as it was.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    blockchain::AccountBalance, error::ApiError, state::AppState, wallet::WalletSession,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletStatusResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<AccountBalance>,
}

async fn status_of(state: &AppState, session: &WalletSession) -> WalletStatusResponse {
    match session.address() {
        Some(address) => {
            let micro = state.chain.get_balance_microalgos(address.as_str()).await;
            WalletStatusResponse {
                connected: true,
                address: Some(address.to_string()),
                balance: Some(AccountBalance::new(
                    address.as_str(),
                    state.chain.network(),
                    micro,
                )),
            }
        }
        None => WalletStatusResponse {
            connected: false,
            address: None,
            balance: None,
        },
    }
}

/// Current session and, when connected, the account balance.
#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet status", body = WalletStatusResponse)
    )
)]
pub async fn get_wallet(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    let session = state.session().await;
    Json(status_of(&state, &session).await)
}

/// Run the wallet's connect flow and adopt its first account.
#[utoipa::path(
    post,
    path = "/v1/wallet/connect",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet connected", body = WalletStatusResponse),
        (status = 400, description = "Connection rejected in the wallet"),
        (status = 502, description = "Wallet bridge unavailable")
    )
)]
pub async fn connect_wallet(
    State(state): State<AppState>,
) -> Result<Json<WalletStatusResponse>, ApiError> {
    let current = state.session().await;
    let next = current.connect(state.wallet.as_ref()).await?;
    state.set_session(next.clone()).await;
    Ok(Json(status_of(&state, &next).await))
}

/// End the session. Always succeeds locally.
#[utoipa::path(
    post,
    path = "/v1/wallet/disconnect",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet disconnected", body = WalletStatusResponse)
    )
)]
pub async fn disconnect_wallet(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    let current = state.session().await;
    let next = current.disconnect(state.wallet.as_ref()).await;
    state.set_session(next.clone()).await;
    Json(status_of(&state, &next).await)
}
