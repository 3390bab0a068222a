// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Available-items listing with a local cache.
//!
//! The listing is served from the last cached fetch when one exists so the
//! UI can paint immediately; a background refresh then replaces the cache.
//! The cache is overwritten on every successful fetch and never expires.
//! Refreshes run one at a time, each fetching only once the previous write
//! has landed, so an older fetch never overwrites a newer one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{Category, Item, ItemStatus};
use crate::storage::LocalDb;
use crate::store::{DocumentStore, StoreResult};

/// Category filter value that matches every category.
pub const ALL_CATEGORIES: &str = "all";

/// A listing snapshot and where it came from.
#[derive(Debug, Clone)]
pub struct Listing {
    pub items: Vec<Item>,
    pub from_cache: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    db: Arc<LocalDb>,
    refresh_lock: Arc<Mutex<()>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>, db: Arc<LocalDb>) -> Self {
        Self {
            store,
            db,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Fetch available items and overwrite the cache, after any refresh
    /// already running. A failed cache write is logged; the fetched items
    /// are still returned.
    pub async fn refresh_available(&self) -> StoreResult<Vec<Item>> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_cache().await
    }

    /// Background refresh, skipped when one is already running.
    fn spawn_refresh(&self) {
        let Ok(guard) = self.refresh_lock.clone().try_lock_owned() else {
            debug!("Listing refresh already running");
            return;
        };
        let catalog = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = catalog.fetch_and_cache().await {
                warn!(error = %e, "Background listing refresh failed");
            }
        });
    }

    async fn fetch_and_cache(&self) -> StoreResult<Vec<Item>> {
        let items = self.store.list_items_by_status(ItemStatus::Available).await?;
        if let Err(e) = self.db.save_listing(&items) {
            warn!(error = %e, "Failed to write listing cache");
        }
        debug!(count = items.len(), "Listing refreshed");
        Ok(items)
    }

    /// Last cached listing, if any. Unreadable caches count as empty.
    pub fn cached_available(&self) -> Option<Listing> {
        match self.db.load_listing() {
            Ok(cached) => cached.map(|c| Listing {
                items: c.items,
                from_cache: true,
                fetched_at: Some(c.fetched_at),
            }),
            Err(e) => {
                warn!(error = %e, "Failed to read listing cache");
                None
            }
        }
    }

    /// Cache-then-refresh: return the cached listing and refresh it in the
    /// background, or fetch directly when nothing is cached yet.
    pub async fn listing(&self) -> StoreResult<Listing> {
        if let Some(cached) = self.cached_available() {
            self.spawn_refresh();
            return Ok(cached);
        }

        let items = self.refresh_available().await?;
        Ok(Listing {
            items,
            from_cache: false,
            fetched_at: Some(Utc::now()),
        })
    }
}

/// Keep items whose title contains `search` (case-insensitive) and whose
/// category matches, where `all` or an empty filter matches everything.
/// An unknown category matches nothing.
pub fn filter_items(items: Vec<Item>, search: Option<&str>, category: Option<&str>) -> Vec<Item> {
    let needle = search.map(str::trim).unwrap_or_default().to_lowercase();
    let category: Option<Option<Category>> = category
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
        .map(|c| c.parse().ok());

    items
        .into_iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .filter(|item| match category {
            Some(wanted) => wanted == Some(item.category),
            None => true,
        })
        .collect()
}
