// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::blockchain::ChainClient;
use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::media::CloudinaryClient;
use crate::models::WalletAddress;
use crate::storage::{LocalDb, QuoteCache};
use crate::store::DocumentStore;
use crate::wallet::{WalletConnector, WalletSession};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub chain: ChainClient,
    pub wallet: Arc<dyn WalletConnector>,
    /// The one wallet session; replaced only by connect and disconnect.
    pub session: Arc<RwLock<WalletSession>>,
    pub db: Arc<LocalDb>,
    pub catalog: Catalog,
    pub checkout: Checkout,
    pub media: Option<Arc<CloudinaryClient>>,
    pub data_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        chain: ChainClient,
        wallet: Arc<dyn WalletConnector>,
        db: Arc<LocalDb>,
        fallback_seller: Option<WalletAddress>,
    ) -> Self {
        let catalog = Catalog::new(store.clone(), db.clone());
        let checkout = Checkout::new(
            store.clone(),
            chain.clone(),
            db.clone(),
            Arc::new(QuoteCache::default()),
            fallback_seller,
        );
        Self {
            store,
            chain,
            wallet,
            session: Arc::new(RwLock::new(WalletSession::disconnected())),
            db,
            catalog,
            checkout,
            media: None,
            data_dir: None,
        }
    }

    pub fn with_media(mut self, media: CloudinaryClient) -> Self {
        self.media = Some(Arc::new(media));
        self
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> WalletSession {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: WalletSession) {
        *self.session.write().await = session;
    }
}
