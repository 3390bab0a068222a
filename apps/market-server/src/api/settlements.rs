// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Settlement outbox: confirmed payments whose order was not recorded.

use axum::{
    extract::{Path, State},
    Json,
};

use super::orders::OrderView;
use crate::{error::ApiError, models::PendingSettlement, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/settlements",
    tag = "Settlements",
    responses(
        (status = 200, description = "Pending settlements, oldest first", body = Vec<PendingSettlement>)
    )
)]
pub async fn list_settlements(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingSettlement>>, ApiError> {
    Ok(Json(state.checkout.pending_settlements()?))
}

/// Replay a pending settlement from the step that failed.
#[utoipa::path(
    post,
    path = "/v1/settlements/{tx_id}/retry",
    tag = "Settlements",
    params(("tx_id" = String, Path, description = "Payment transaction ID")),
    responses(
        (status = 200, description = "Order recorded", body = OrderView),
        (status = 404, description = "No pending settlement for this transaction"),
        (status = 503, description = "Document store still failing")
    )
)]
pub async fn retry_settlement(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order = state.checkout.retry_settlement(&tx_id).await?;
    Ok(Json(OrderView::new(order, state.chain.network())))
}
