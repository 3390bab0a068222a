// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Marketplace Data Models
//!
//! Documents stored in the three remote collections and the value types
//! shared between the store, the checkout flow and the HTTP API. Field
//! names serialize in camelCase because that is the schema of the
//! `items`, `orders` and `profiles` collections.
//!
//! ## Model Categories
//!
//! - **Items**: listings a seller offers for sale
//! - **Orders**: records of completed purchases
//! - **Profiles**: contact details keyed by wallet address

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Length of an encoded Algorand address (32-byte key + 4-byte checksum, base32).
pub const ADDRESS_LEN: usize = 58;

/// Algorand account address.
///
/// Only the textual shape is checked (58 characters of the RFC 4648 base32
/// alphabet). The checksum is left to the node, which rejects malformed
/// receivers on submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Validate and wrap a raw address string.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.len() != ADDRESS_LEN {
            return Err(format!(
                "Address must be {ADDRESS_LEN} characters, got {}",
                trimmed.len()
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        {
            return Err("Address must only contain base32 characters (A-Z, 2-7)".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in views, e.g. `ABCDEF...WXYZ`.
    pub fn short(&self) -> String {
        if self.0.len() <= 10 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Item Models
// =============================================================================

/// Listing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Books,
    Electronics,
    Furniture,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Books => "books",
            Category::Electronics => "electronics",
            Category::Furniture => "furniture",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "books" => Ok(Category::Books),
            "electronics" => Ok(Category::Electronics),
            "furniture" => Ok(Category::Furniture),
            "other" => Ok(Category::Other),
            other => Err(format!("Unknown category `{other}`")),
        }
    }
}

/// Availability of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Available,
    Sold,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Sold => "sold",
        }
    }
}

/// A listing as stored in the `items` collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Document id (not stored as a field).
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Price in ALGO.
    pub price: f64,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub image_url: String,
    /// Seller's wallet address. Older listings may lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_address: Option<String>,
    #[serde(default)]
    pub seller_name: String,
    #[serde(default)]
    pub seller_roll: String,
    #[serde(default)]
    pub seller_phone: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Seller address, treating an empty string as absent.
    pub fn seller(&self) -> Option<&str> {
        self.seller_address
            .as_deref()
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
    }

    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }
}

/// Fields a seller submits for a new listing. The store assigns the id,
/// the `available` status and the creation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub image_url: String,
    pub seller_address: String,
    pub seller_name: String,
    pub seller_roll: String,
    pub seller_phone: String,
    pub pickup_location: String,
}

impl NewItem {
    pub fn into_item(self, id: String, created_at: DateTime<Utc>) -> Item {
        Item {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            category: self.category,
            image_url: self.image_url,
            seller_address: Some(self.seller_address),
            seller_name: self.seller_name,
            seller_roll: self.seller_roll,
            seller_phone: self.seller_phone,
            pickup_location: self.pickup_location,
            status: ItemStatus::Available,
            created_at: Some(created_at),
        }
    }
}

/// Sort a seller's listings so available items come before sold ones.
/// The sort is stable, so store order is kept within each group.
pub fn sort_available_first(items: &mut [Item]) {
    items.sort_by_key(|item| !item.is_available());
}

// =============================================================================
// Order Models
// =============================================================================

/// Order lifecycle. Checkout only ever writes `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    #[default]
    Paid,
    Completed,
}

/// A purchase record as stored in the `orders` collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    pub buyer_address: String,
    #[serde(default)]
    pub buyer_name: String,
    #[serde(default)]
    pub buyer_roll: String,
    #[serde(default)]
    pub buyer_phone: String,
    pub seller_address: String,
    #[serde(default)]
    pub seller_name: String,
    #[serde(default)]
    pub seller_roll: String,
    #[serde(default)]
    pub seller_phone: String,
    #[serde(default)]
    pub pickup_location: String,
    pub item_id: String,
    #[serde(default)]
    pub item_title: String,
    pub price: f64,
    pub tx_id: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Order fields written by checkout; the store assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub buyer_address: String,
    pub buyer_name: String,
    pub buyer_roll: String,
    pub buyer_phone: String,
    pub seller_address: String,
    pub seller_name: String,
    pub seller_roll: String,
    pub seller_phone: String,
    pub pickup_location: String,
    pub item_id: String,
    pub item_title: String,
    pub price: f64,
    pub tx_id: String,
    pub status: OrderStatus,
}

impl NewOrder {
    pub fn into_order(self, id: String, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            buyer_address: self.buyer_address,
            buyer_name: self.buyer_name,
            buyer_roll: self.buyer_roll,
            buyer_phone: self.buyer_phone,
            seller_address: self.seller_address,
            seller_name: self.seller_name,
            seller_roll: self.seller_roll,
            seller_phone: self.seller_phone,
            pickup_location: self.pickup_location,
            item_id: self.item_id,
            item_title: self.item_title,
            price: self.price,
            tx_id: self.tx_id,
            status: self.status,
            created_at: Some(created_at),
        }
    }
}

// =============================================================================
// Profile Models
// =============================================================================

/// Contact details stored under the owner's wallet address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Wallet address (document id).
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roll_no: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub name: String,
    pub roll_no: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub pickup_location: String,
}

impl ProfileFields {
    /// Name and roll number are the minimum a counterparty needs.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.roll_no.trim().is_empty()
    }

    /// Take `existing` values for every field left blank here.
    pub fn fill_blanks_from(self, existing: &ProfileFields) -> ProfileFields {
        let pick = |new: String, old: &str| {
            if new.trim().is_empty() {
                old.to_string()
            } else {
                new
            }
        };
        ProfileFields {
            name: pick(self.name, &existing.name),
            roll_no: pick(self.roll_no, &existing.roll_no),
            phone: pick(self.phone, &existing.phone),
            pickup_location: pick(self.pickup_location, &existing.pickup_location),
        }
    }
}

impl Profile {
    pub fn fields(&self) -> ProfileFields {
        ProfileFields {
            name: self.name.clone(),
            roll_no: self.roll_no.clone(),
            phone: self.phone.clone(),
            pickup_location: self.pickup_location.clone(),
        }
    }
}

// =============================================================================
// Settlement Models
// =============================================================================

/// The checkout write that failed after the payment confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStep {
    MarkItemSold,
    RecordOrder,
}

/// A confirmed payment whose item/order writes did not complete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSettlement {
    pub tx_id: String,
    pub item_id: String,
    /// Order to write once the item is marked sold.
    pub order: NewOrder,
    pub failed_step: SettlementStep,
    pub error: String,
    pub recorded_at: DateTime<Utc>,
    /// Manual retries attempted so far.
    #[serde(default)]
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "HZ57J3K46JIJXILONBBZOHX6BKPXEM2VVXNRFSUED6DKFD5ZD24PMJ3MVA";

    fn item(id: &str, status: ItemStatus) -> Item {
        Item {
            id: id.to_string(),
            title: format!("Item {id}"),
            description: String::new(),
            price: 1.0,
            category: Category::Books,
            image_url: String::new(),
            seller_address: Some(ADDR.to_string()),
            seller_name: String::new(),
            seller_roll: String::new(),
            seller_phone: String::new(),
            pickup_location: String::new(),
            status,
            created_at: None,
        }
    }

    #[test]
    fn wallet_address_validation() {
        assert!(WalletAddress::parse(ADDR).is_ok());
        assert!(WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12").is_err());
        assert!(WalletAddress::parse(&ADDR.to_lowercase()).is_err());
        assert_eq!(WalletAddress::from(ADDR).short(), "HZ57J3...3MVA");
    }

    #[test]
    fn item_document_uses_camel_case() {
        let json = serde_json::to_value(item("a", ItemStatus::Sold)).unwrap();
        assert_eq!(json["sellerAddress"], ADDR);
        assert_eq!(json["status"], "sold");
        assert_eq!(json["category"], "books");
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn empty_seller_address_counts_as_missing() {
        let mut listing = item("a", ItemStatus::Available);
        listing.seller_address = Some("  ".to_string());
        assert_eq!(listing.seller(), None);
        listing.seller_address = None;
        assert_eq!(listing.seller(), None);
    }

    #[test]
    fn sort_keeps_available_before_sold() {
        let mut items = vec![
            item("1", ItemStatus::Sold),
            item("2", ItemStatus::Available),
            item("3", ItemStatus::Sold),
            item("4", ItemStatus::Available),
        ];
        sort_available_first(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Electronics".parse::<Category>().unwrap(), Category::Electronics);
        assert!("toys".parse::<Category>().is_err());
    }

    #[test]
    fn profile_completeness() {
        let mut fields = ProfileFields {
            name: "Asha".to_string(),
            roll_no: "22BCS001".to_string(),
            ..Default::default()
        };
        assert!(fields.is_complete());
        fields.roll_no = " ".to_string();
        assert!(!fields.is_complete());
    }

    #[test]
    fn blank_profile_fields_fall_back_to_existing() {
        let existing = ProfileFields {
            name: "Kiran".to_string(),
            roll_no: "23EE042".to_string(),
            phone: "98450".to_string(),
            pickup_location: "Gate 2".to_string(),
        };
        let submitted = ProfileFields {
            name: "Kiran R".to_string(),
            roll_no: "23EE042".to_string(),
            phone: "  ".to_string(),
            pickup_location: String::new(),
        };
        let merged = submitted.fill_blanks_from(&existing);
        assert_eq!(merged.name, "Kiran R");
        assert_eq!(merged.phone, "98450");
        assert_eq!(merged.pickup_location, "Gate 2");
    }
}
