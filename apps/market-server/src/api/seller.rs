// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Seller dashboard: own listings and incoming orders.

use axum::{extract::State, Json};

use super::{
    connected_address,
    orders::{views, OrderView},
};
use crate::{error::ApiError, models::Item, state::AppState};

/// The connected seller's listings, available before sold.
#[utoipa::path(
    get,
    path = "/v1/seller/items",
    tag = "Seller",
    responses(
        (status = 200, description = "Seller's listings", body = Vec<Item>),
        (status = 401, description = "Wallet not connected")
    )
)]
pub async fn list_seller_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    let seller = connected_address(&state).await?;
    Ok(Json(state.store.list_items_by_seller(seller.as_str()).await?))
}

/// Orders received by the connected seller.
#[utoipa::path(
    get,
    path = "/v1/seller/orders",
    tag = "Seller",
    responses(
        (status = 200, description = "Orders for the seller's items", body = Vec<OrderView>),
        (status = 401, description = "Wallet not connected")
    )
)]
pub async fn list_seller_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let seller = connected_address(&state).await?;
    let orders = state.store.list_orders_by_seller(seller.as_str()).await?;
    Ok(Json(views(orders, state.chain.network())))
}
