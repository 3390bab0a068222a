// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campus_market::{
    api::router,
    blockchain::ChainClient,
    config::{AppConfig, LogFormat, StoreBackend},
    listing_poller::ListingPoller,
    media::CloudinaryClient,
    state::AppState,
    storage::LocalDb,
    store::{DocumentStore, FirestoreClient, InMemoryStore},
    wallet::{WalletBridgeClient, WalletSession},
};

fn init_tracing(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    init_tracing(&config.log_format);

    let db = Arc::new(
        LocalDb::open(&config.local_db_path()).expect("Failed to open local database"),
    );

    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreBackend::Firestore {
            base_url,
            project_id,
            api_key,
        } => Arc::new(
            FirestoreClient::new(base_url, project_id, api_key)
                .expect("Failed to build document store client"),
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory document store; data is lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    let chain = ChainClient::testnet(&config.algod_url, config.algod_token.clone())
        .expect("Failed to build ledger client");
    let wallet = Arc::new(
        WalletBridgeClient::new(&config.wallet_bridge_url)
            .expect("Failed to build wallet bridge client"),
    );

    let mut state = AppState::new(
        store,
        chain,
        wallet.clone(),
        db,
        config.fallback_seller.clone(),
    )
    .with_data_dir(config.data_dir.clone());

    match &config.cloudinary {
        Some(cloudinary) => {
            state = state.with_media(
                CloudinaryClient::new(cloudinary).expect("Failed to build image host client"),
            );
        }
        None => warn!("Cloudinary is not configured; image uploads are disabled"),
    }

    state
        .set_session(WalletSession::restore(wallet.as_ref()).await)
        .await;

    let shutdown = CancellationToken::new();
    let poller = ListingPoller::new(state.catalog.clone(), config.listing_poll_interval);
    let poller_handle = tokio::spawn(poller.run(shutdown.clone()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!(%addr, "Campus Market server listening (docs at /docs)");

    let app = router(state);
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await
        .expect("HTTP server failed");

    shutdown.cancel();
    let _ = poller_handle.await;
}
