// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firestore REST backend for [`DocumentStore`].
//!
//! Requests are authorized with the project's web API key only, the same
//! access the public web client has; collection rules live in Firestore.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::codec::{decode_document, encode_fields, Document};
use super::{DocumentStore, StoreError, StoreResult, ITEMS, ORDERS, PROFILES};
use crate::models::{
    sort_available_first, Item, ItemStatus, NewItem, NewOrder, Order, Profile, ProfileFields,
};

#[derive(Debug, Clone)]
pub struct FirestoreClient {
    documents_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// One element of a `runQuery` response stream. Elements without a
/// document only carry read metadata.
#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<Document>,
}

impl FirestoreClient {
    pub fn new(base_url: &str, project_id: &str, api_key: &str) -> Result<Self, StoreError> {
        url::Url::parse(base_url).map_err(|e| StoreError::Request(format!("invalid base URL: {e}")))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| StoreError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            api_key: api_key.to_string(),
            http,
        })
    }

    async fn create<T: Serialize>(
        &self,
        collection: &str,
        record: &T,
        skip: &[&str],
    ) -> StoreResult<Document> {
        let fields = encode_fields(record, skip)?;
        let response = self
            .http
            .post(format!("{}/{}", self.documents_url, collection))
            .query(&[("key", &self.api_key)])
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(transport)?;
        decode(response, collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let response = self
            .http
            .get(format!("{}/{}/{}", self.documents_url, collection, id))
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response, collection).await.map(Some)
    }

    /// Documents of `collection` whose string `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Document>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value }
                    }
                }
            }
        });
        let response = self
            .http
            .post(format!("{}:runQuery", self.documents_url))
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let results: Vec<QueryResult> = decode(response, collection).await?;
        debug!(collection, field, count = results.len(), "Query returned");
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }

    /// Write the masked fields of a document. With `must_exist` the write
    /// fails instead of creating a missing document.
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Map<String, Value>,
        must_exist: bool,
    ) -> StoreResult<Document> {
        let mut query: Vec<(&str, String)> = vec![("key", self.api_key.clone())];
        query.extend(fields.keys().map(|k| ("updateMask.fieldPaths", k.clone())));
        if must_exist {
            query.push(("currentDocument.exists", "true".to_string()));
        }
        let response = self
            .http
            .patch(format!("{}/{}/{}", self.documents_url, collection, id))
            .query(&query)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(transport)?;
        decode(response, &format!("{collection}/{id}")).await
    }

    async fn query_items(&self, field: &str, value: &str) -> StoreResult<Vec<Item>> {
        self.query_eq(ITEMS, field, value)
            .await?
            .iter()
            .map(|doc| decode_document(doc, "id"))
            .collect()
    }

    async fn query_orders(&self, field: &str, value: &str) -> StoreResult<Vec<Order>> {
        self.query_eq(ORDERS, field, value)
            .await?
            .iter()
            .map(|doc| decode_document(doc, "id"))
            .collect()
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Request(e.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> StoreResult<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn add_item(&self, item: NewItem) -> StoreResult<Item> {
        let item = item.into_item(String::new(), Utc::now());
        let doc = self.create(ITEMS, &item, &["id"]).await?;
        Ok(Item {
            id: doc.id().to_string(),
            ..item
        })
    }

    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>> {
        match self.get(ITEMS, id).await? {
            Some(doc) => decode_document(&doc, "id").map(Some),
            None => Ok(None),
        }
    }

    async fn list_items_by_status(&self, status: ItemStatus) -> StoreResult<Vec<Item>> {
        self.query_items("status", status.as_str()).await
    }

    async fn list_items_by_seller(&self, seller: &str) -> StoreResult<Vec<Item>> {
        let mut items = self.query_items("sellerAddress", seller).await?;
        sort_available_first(&mut items);
        Ok(items)
    }

    async fn update_item_status(&self, id: &str, status: ItemStatus) -> StoreResult<()> {
        let fields = encode_fields(&json!({ "status": status }), &[])?;
        self.patch(ITEMS, id, fields, true)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => StoreError::NotFound(format!("Item {id}")),
                other => other,
            })?;
        Ok(())
    }

    async fn add_order(&self, order: NewOrder) -> StoreResult<Order> {
        let order = order.into_order(String::new(), Utc::now());
        let doc = self.create(ORDERS, &order, &["id"]).await?;
        Ok(Order {
            id: doc.id().to_string(),
            ..order
        })
    }

    async fn list_orders_by_buyer(&self, buyer: &str) -> StoreResult<Vec<Order>> {
        self.query_orders("buyerAddress", buyer).await
    }

    async fn list_orders_by_seller(&self, seller: &str) -> StoreResult<Vec<Order>> {
        self.query_orders("sellerAddress", seller).await
    }

    async fn get_profile(&self, address: &str) -> StoreResult<Option<Profile>> {
        match self.get(PROFILES, address).await? {
            Some(doc) => decode_document(&doc, "address").map(Some),
            None => Ok(None),
        }
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
        let encoded = encode_fields(&profile, &["address"])?;
        self.patch(PROFILES, address, encoded, false).await?;
        Ok(profile)
    }
}
