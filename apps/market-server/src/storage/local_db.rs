// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded local database backed by redb.
//!
//! ## Table Layout
//!
//! - `listing_cache`: `"available_items"` → serialized [`CachedListing`]
//! - `settlement_outbox`: tx id → serialized [`PendingSettlement`]

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::models::{Item, PendingSettlement};

// =============================================================================
// Table Definitions
// =============================================================================

/// Last fetched listing, overwritten on every successful fetch.
const LISTING_CACHE: TableDefinition<&str, &[u8]> = TableDefinition::new("listing_cache");

/// Confirmed payments awaiting their item/order writes.
const SETTLEMENT_OUTBOX: TableDefinition<&str, &[u8]> = TableDefinition::new("settlement_outbox");

const AVAILABLE_ITEMS_KEY: &str = "available_items";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LocalDbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type LocalDbResult<T> = Result<T, LocalDbError>;

/// The available-items list as last fetched from the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedListing {
    pub items: Vec<Item>,
    pub fetched_at: DateTime<Utc>,
}

// =============================================================================
// LocalDb
// =============================================================================

pub struct LocalDb {
    db: Database,
}

impl LocalDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LocalDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LISTING_CACHE)?;
            let _ = write_txn.open_table(SETTLEMENT_OUTBOX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Listing cache
    // =========================================================================

    /// Replace the cached listing.
    pub fn save_listing(&self, items: &[Item]) -> LocalDbResult<CachedListing> {
        let cached = CachedListing {
            items: items.to_vec(),
            fetched_at: Utc::now(),
        };
        let json = serde_json::to_vec(&cached)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(LISTING_CACHE)?;
            table.insert(AVAILABLE_ITEMS_KEY, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(cached)
    }

    pub fn load_listing(&self) -> LocalDbResult<Option<CachedListing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTING_CACHE)?;
        match table.get(AVAILABLE_ITEMS_KEY)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Settlement outbox
    // =========================================================================

    /// Insert or replace the outbox record for a transaction.
    pub fn put_settlement(&self, settlement: &PendingSettlement) -> LocalDbResult<()> {
        let json = serde_json::to_vec(settlement)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTLEMENT_OUTBOX)?;
            table.insert(settlement.tx_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_settlement(&self, tx_id: &str) -> LocalDbResult<Option<PendingSettlement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTLEMENT_OUTBOX)?;
        match table.get(tx_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All outstanding settlements, oldest first.
    pub fn list_settlements(&self) -> LocalDbResult<Vec<PendingSettlement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTLEMENT_OUTBOX)?;
        let mut settlements = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            settlements.push(serde_json::from_slice::<PendingSettlement>(value.value())?);
        }
        settlements.sort_by_key(|s| s.recorded_at);
        Ok(settlements)
    }

    /// Returns whether a record was removed.
    pub fn remove_settlement(&self, tx_id: &str) -> LocalDbResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SETTLEMENT_OUTBOX)?;
            let removed = table.remove(tx_id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
