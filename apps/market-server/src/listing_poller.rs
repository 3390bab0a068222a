// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Listing Poller
//!
//! Background task that re-fetches the available-items list on a fixed
//! interval (default 30 s) so the cached listing stays close to the
//! document store while the service runs.
//!
//! ## Shutdown
//!
//! Stops when its `tokio_util::sync::CancellationToken` is cancelled.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;

/// Default interval between refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct ListingPoller {
    catalog: Catalog,
    poll_interval: Duration,
}

impl ListingPoller {
    pub fn new(catalog: Catalog, poll_interval: Duration) -> Self {
        Self {
            catalog,
            poll_interval,
        }
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Listing poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Listing poller shutting down");
                return;
            }

            self.poll_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Listing poller shutting down");
                    return;
                }
            }
        }
    }

    async fn poll_step(&self) {
        match self.catalog.refresh_available().await {
            Ok(items) => debug!(count = items.len(), "Listing poller: refreshed"),
            Err(e) => warn!(error = %e, "Listing poller: refresh failed"),
        }
    }
}
