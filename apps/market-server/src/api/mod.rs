// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::AccountBalance,
    checkout::{CheckoutReceipt, PurchaseQuote, Shortfall},
    error::ApiError,
    media::MAX_IMAGE_BYTES,
    models::{
        Category, Item, ItemStatus, Order, OrderStatus, PendingSettlement, Profile, ProfileFields,
        SettlementStep, WalletAddress,
    },
    state::AppState,
};

pub mod checkout;
pub mod health;
pub mod items;
pub mod orders;
pub mod profile;
pub mod seller;
pub mod settlements;
pub mod uploads;
pub mod wallet;

/// Address of the connected wallet, or 401.
pub(crate) async fn connected_address(state: &AppState) -> Result<WalletAddress, ApiError> {
    let session = state.session().await;
    Ok(session.require_address()?.clone())
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/{id}", get(items::get_item))
        .route("/items/{id}/status", put(items::update_item_status))
        .route("/seller/items", get(seller::list_seller_items))
        .route("/seller/orders", get(seller::list_seller_orders))
        .route("/orders", get(orders::list_buyer_orders))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::save_profile),
        )
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/connect", post(wallet::connect_wallet))
        .route("/wallet/disconnect", post(wallet::disconnect_wallet))
        .route("/checkout/{item_id}/quote", post(checkout::quote))
        .route("/checkout/{item_id}", post(checkout::purchase))
        .route(
            "/uploads",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/settlements", get(settlements::list_settlements))
        .route(
            "/settlements/{tx_id}/retry",
            post(settlements::retry_settlement),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item_status,
        seller::list_seller_items,
        seller::list_seller_orders,
        orders::list_buyer_orders,
        profile::get_profile,
        profile::save_profile,
        wallet::get_wallet,
        wallet::connect_wallet,
        wallet::disconnect_wallet,
        checkout::quote,
        checkout::purchase,
        uploads::upload_image,
        settlements::list_settlements,
        settlements::retry_settlement
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            items::ListingResponse,
            items::CreateItemRequest,
            items::UpdateStatusRequest,
            orders::OrderView,
            wallet::WalletStatusResponse,
            uploads::UploadResponse,
            Item,
            Category,
            ItemStatus,
            Order,
            OrderStatus,
            Profile,
            ProfileFields,
            PendingSettlement,
            SettlementStep,
            AccountBalance,
            PurchaseQuote,
            Shortfall,
            CheckoutReceipt
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Items", description = "Product listings"),
        (name = "Seller", description = "Seller dashboard"),
        (name = "Orders", description = "Buyer order history"),
        (name = "Profile", description = "Contact details per wallet"),
        (name = "Wallet", description = "Wallet session"),
        (name = "Checkout", description = "Quote and purchase"),
        (name = "Uploads", description = "Listing images"),
        (name = "Settlements", description = "Confirmed payments awaiting their order record")
    )
)]
struct ApiDoc;
