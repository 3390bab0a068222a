// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Product listing endpoints: browse, detail, create and relist.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use super::connected_address;
use crate::{
    catalog::filter_items,
    error::ApiError,
    models::{Category, Item, ItemStatus, NewItem},
    state::AppState,
};

/// Query parameters for the listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemsQuery {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Category name, or "all".
    #[param(default = "all")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingResponse {
    pub items: Vec<Item>,
    /// True when served from the local cache while a refresh runs.
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Price in ALGO
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: ItemStatus,
}

/// Refresh the listing cache after a write. A failure only delays the
/// change until the next poll.
async fn refresh_listing(state: &AppState) {
    if let Err(e) = state.catalog.refresh_available().await {
        warn!(error = %e, "Listing refresh after write failed");
    }
}

/// Available items, filtered by title search and category.
#[utoipa::path(
    get,
    path = "/v1/items",
    tag = "Items",
    params(ItemsQuery),
    responses(
        (status = 200, description = "Available items", body = ListingResponse),
        (status = 503, description = "Document store unavailable")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<ListingResponse>, ApiError> {
    let listing = state.catalog.listing().await?;
    let items = filter_items(
        listing.items,
        query.search.as_deref(),
        query.category.as_deref(),
    );
    Ok(Json(ListingResponse {
        items,
        from_cache: listing.from_cache,
        fetched_at: listing.fetched_at,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/items/{id}",
    tag = "Items",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item found", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    state
        .store
        .get_item(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found."))
}

/// List a new item for sale.
///
/// The seller's contact details are copied from their saved profile, so a
/// profile with name and roll number must exist first.
#[utoipa::path(
    post,
    path = "/v1/items",
    tag = "Items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item listed", body = Item),
        (status = 400, description = "Missing profile or listing fields"),
        (status = 401, description = "Wallet not connected")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let seller = connected_address(&state).await?;

    let profile = state
        .store
        .get_profile(seller.as_str())
        .await?
        .filter(|p| p.fields().is_complete())
        .ok_or_else(|| {
            ApiError::bad_request(
                "Please save your profile (name & roll number) before listing items.",
            )
        })?;

    let title = request.title.trim();
    if title.is_empty()
        || !request.price.is_finite()
        || request.price <= 0.0
        || request.image_url.trim().is_empty()
    {
        return Err(ApiError::bad_request(
            "Please fill in the title, price, and upload an image.",
        ));
    }

    let item = state
        .store
        .add_item(NewItem {
            title: title.to_string(),
            description: request.description.trim().to_string(),
            price: request.price,
            category: request.category,
            image_url: request.image_url.trim().to_string(),
            seller_address: seller.to_string(),
            seller_name: profile.name,
            seller_roll: profile.roll_no,
            seller_phone: profile.phone,
            pickup_location: profile.pickup_location,
        })
        .await?;

    info!(item_id = %item.id, seller = %seller.short(), "Item listed");
    refresh_listing(&state).await;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Mark an item sold or relist it. Only the item's seller may do this.
#[utoipa::path(
    put,
    path = "/v1/items/{id}/status",
    tag = "Items",
    params(("id" = String, Path, description = "Item ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Item),
        (status = 401, description = "Wallet not connected"),
        (status = 403, description = "Not the seller of this item"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Item>, ApiError> {
    let caller = connected_address(&state).await?;
    let mut item = state
        .store
        .get_item(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found."))?;

    if item.seller() != Some(caller.as_str()) {
        return Err(ApiError::forbidden("Only the seller can change this listing"));
    }

    state.store.update_item_status(&id, request.status).await?;
    item.status = request.status;
    info!(item_id = %id, status = request.status.as_str(), "Item status changed");
    refresh_listing(&state).await;
    Ok(Json(item))
}
