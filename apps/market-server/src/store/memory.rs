// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory [`DocumentStore`] used for local runs (`STORE_BACKEND=memory`)
//! and tests. Records keep insertion order, like an unordered query against
//! a small collection.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::{
    sort_available_first, Item, ItemStatus, NewItem, NewOrder, Order, Profile, ProfileFields,
};

#[derive(Default)]
struct Collections {
    items: Vec<Item>,
    orders: Vec<Order>,
    profiles: HashMap<String, Profile>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed item, keeping its id. Lets callers seed
    /// listings that predate seller addresses.
    pub async fn insert_item(&self, item: Item) -> Item {
        self.inner.write().await.items.push(item.clone());
        item
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn add_item(&self, item: NewItem) -> StoreResult<Item> {
        let item = item.into_item(Uuid::new_v4().to_string(), Utc::now());
        Ok(self.insert_item(item).await)
    }

    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>> {
        let inner = self.inner.read().await;
        Ok(inner.items.iter().find(|item| item.id == id).cloned())
    }

    async fn list_items_by_status(&self, status: ItemStatus) -> StoreResult<Vec<Item>> {
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .iter()
            .filter(|item| item.status == status)
            .cloned()
            .collect())
    }

    async fn list_items_by_seller(&self, seller: &str) -> StoreResult<Vec<Item>> {
        let mut items: Vec<Item> = {
            let inner = self.inner.read().await;
            inner
                .items
                .iter()
                .filter(|item| item.seller_address.as_deref() == Some(seller))
                .cloned()
                .collect()
        };
        sort_available_first(&mut items);
        Ok(items)
    }

    async fn update_item_status(&self, id: &str, status: ItemStatus) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let Some(item) = inner.items.iter_mut().find(|item| item.id == id) else {
            return Err(StoreError::NotFound(format!("Item {id}")));
        };
        item.status = status;
        Ok(())
    }

    async fn add_order(&self, order: NewOrder) -> StoreResult<Order> {
        let order = order.into_order(Uuid::new_v4().to_string(), Utc::now());
        self.inner.write().await.orders.push(order.clone());
        Ok(order)
    }

    async fn list_orders_by_buyer(&self, buyer: &str) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|order| order.buyer_address == buyer)
            .cloned()
            .collect())
    }

    async fn list_orders_by_seller(&self, seller: &str) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|order| order.seller_address == seller)
            .cloned()
            .collect())
    }

    async fn get_profile(&self, address: &str) -> StoreResult<Option<Profile>> {
        Ok(self.inner.read().await.profiles.get(address).cloned())
    }

    async fn save_profile(&self, address: &str, fields: ProfileFields) -> StoreResult<Profile> {
        let profile = Profile {
            address: address.to_string(),
            name: fields.name,
            roll_no: fields.roll_no,
            phone: fields.phone,
            pickup_location: fields.pickup_location,
            updated_at: Some(Utc::now()),
        };
        self.inner
            .write()
            .await
            .profiles
            .insert(address.to_string(), profile.clone());
        Ok(profile)
    }
}
