// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Store
//!
//! Marketplace records live in a remote document database with three
//! collections:
//!
//! | Collection | Document id | Written by |
//! |------------|-------------|------------|
//! | `items` | generated | sellers, checkout |
//! | `orders` | generated | checkout |
//! | `profiles` | wallet address | buyers, sellers |
//!
//! There is no referential integrity between collections and no locking:
//! the last write to a field wins.

pub mod codec;
pub mod firestore;
pub mod memory;

use async_trait::async_trait;

use crate::models::{Item, ItemStatus, NewItem, NewOrder, Order, Profile, ProfileFields};

pub use firestore::FirestoreClient;
pub use memory::InMemoryStore;

pub const ITEMS: &str = "items";
pub const ORDERS: &str = "orders";
pub const PROFILES: &str = "profiles";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Request to document store failed: {0}")]
    Request(String),

    #[error("Document store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid document: {0}")]
    InvalidResponse(String),
}

/// Record operations used by the marketplace.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a listing with status `available` and a creation timestamp.
    async fn add_item(&self, item: NewItem) -> StoreResult<Item>;

    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>>;

    async fn list_items_by_status(&self, status: ItemStatus) -> StoreResult<Vec<Item>>;

    /// A seller's listings, available before sold.
    async fn list_items_by_seller(&self, seller: &str) -> StoreResult<Vec<Item>>;

    /// Fails with [`StoreError::NotFound`] when the item does not exist.
    async fn update_item_status(&self, id: &str, status: ItemStatus) -> StoreResult<()>;

    async fn add_order(&self, order: NewOrder) -> StoreResult<Order>;

    async fn list_orders_by_buyer(&self, buyer: &str) -> StoreResult<Vec<Order>>;

    async fn list_orders_by_seller(&self, seller: &str) -> StoreResult<Vec<Order>>;

    async fn get_profile(&self, address: &str) -> StoreResult<Option<Profile>>;

    /// Create or overwrite the profile stored under `address`.
    async fn save_profile(&self, address: &str, fields: ProfileFields) -> StoreResult<Profile>;
}
