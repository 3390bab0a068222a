// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Buyer order history.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use super::connected_address;
use crate::{blockchain::NetworkConfig, error::ApiError, models::Order, state::AppState};

/// An order with a link to its payment on the explorer.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub explorer_url: String,
}

impl OrderView {
    pub fn new(order: Order, network: &NetworkConfig) -> Self {
        let explorer_url = network.explorer_tx_url(&order.tx_id);
        Self {
            order,
            explorer_url,
        }
    }
}

pub(super) fn views(orders: Vec<Order>, network: &NetworkConfig) -> Vec<OrderView> {
    orders
        .into_iter()
        .map(|order| OrderView::new(order, network))
        .collect()
}

/// Orders placed by the connected wallet.
#[utoipa::path(
    get,
    path = "/v1/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Buyer's orders", body = Vec<OrderView>),
        (status = 401, description = "Wallet not connected"),
        (status = 503, description = "Document store unavailable")
    )
)]
pub async fn list_buyer_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let buyer = connected_address(&state).await?;
    let orders = state.store.list_orders_by_buyer(buyer.as_str()).await?;
    Ok(Json(views(orders, state.chain.network())))
}
