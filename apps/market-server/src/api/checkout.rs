// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Checkout endpoints.
//!
//! `quote` takes the balance snapshot the purchase will be checked against;
//! `purchase` signs, submits and settles the payment, and only answers once
//! the transaction is confirmed (or has failed).

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::warn;

use super::connected_address;
use crate::{
    checkout::{CheckoutReceipt, PurchaseQuote},
    error::ApiError,
    models::ProfileFields,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/checkout/{item_id}/quote",
    tag = "Checkout",
    params(("item_id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Cost breakdown and affordability", body = PurchaseQuote),
        (status = 401, description = "Wallet not connected"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item already sold")
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<PurchaseQuote>, ApiError> {
    let buyer = connected_address(&state).await?;
    Ok(Json(state.checkout.quote(&buyer, &item_id).await?))
}

/// Buy an item with the connected wallet.
///
/// The body carries the buyer's contact details, which are also saved as
/// their profile.
#[utoipa::path(
    post,
    path = "/v1/checkout/{item_id}",
    tag = "Checkout",
    params(("item_id" = String, Path, description = "Item ID")),
    request_body = ProfileFields,
    responses(
        (status = 200, description = "Payment confirmed and order recorded", body = CheckoutReceipt),
        (status = 400, description = "Missing buyer details or signature cancelled"),
        (status = 401, description = "Wallet not connected"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item already sold"),
        (status = 422, description = "Insufficient funds or missing seller address"),
        (status = 500, description = "Payment confirmed but not recorded"),
        (status = 504, description = "Payment not confirmed in time")
    )
)]
pub async fn purchase(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(buyer): Json<ProfileFields>,
) -> Result<Json<CheckoutReceipt>, ApiError> {
    let session = state.session().await;
    let receipt = state
        .checkout
        .purchase(&session, state.wallet.as_ref(), &item_id, buyer)
        .await?;
    if let Err(e) = state.catalog.refresh_available().await {
        warn!(error = %e, "Listing refresh after purchase failed");
    }
    Ok(Json(receipt))
}
