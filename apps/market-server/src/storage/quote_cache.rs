// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache of buyer balance snapshots.
//!
//! The checkout page fetches the buyer's balance once; the purchase is then
//! checked against that snapshot instead of a fresh lookup.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// How long a balance snapshot stays usable.
pub const QUOTE_TTL: Duration = Duration::from_secs(300);

pub const QUOTE_CAPACITY: usize = 256;

struct CacheEntry {
    balance_microalgos: u64,
    inserted_at: Instant,
}

pub struct QuoteCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(QUOTE_CAPACITY, QUOTE_TTL)
    }
}

impl QuoteCache {
    /// - `capacity`: Max number of buyer addresses to remember.
    /// - `ttl`: Time-to-live for each snapshot.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Snapshot for `address`, or `None` if absent or expired.
    pub fn get(&self, address: &str) -> Option<u64> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(address) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.balance_microalgos);
            }
            cache.pop(address);
        }
        None
    }

    pub fn put(&self, address: &str, balance_microalgos: u64) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                address.to_string(),
                CacheEntry {
                    balance_microalgos,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop the snapshot after it has been spent.
    pub fn invalidate(&self, address: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(address);
        }
    }
}
