// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Affordability check for a purchase.
//!
//! A buyer can pay when their balance covers the price, the network fee and
//! the minimum balance their account must keep afterwards. All arithmetic
//! is in integer microALGO.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{
    algos_to_microalgos, format_algos, MIN_BALANCE_MICROALGOS, NETWORK_FEE_MICROALGOS,
};
use crate::models::Item;

/// Balance needed to pay `price_microalgos`.
pub fn required_microalgos(price_microalgos: u64) -> u64 {
    price_microalgos
        .saturating_add(NETWORK_FEE_MICROALGOS)
        .saturating_add(MIN_BALANCE_MICROALGOS)
}

/// How far a balance falls short of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Shortfall {
    pub required_microalgos: u64,
    pub available_microalgos: u64,
    pub deficit_microalgos: u64,
}

impl Shortfall {
    pub fn message(&self) -> String {
        format!(
            "Insufficient balance. You need {} ALGO (price + 0.001 fee + 0.1 minimum balance) \
             but have {} ALGO. Short by {} ALGO.",
            format_algos(self.required_microalgos),
            format_algos(self.available_microalgos),
            format_algos(self.deficit_microalgos)
        )
    }
}

/// Blocked iff `balance < required`; the deficit is exact.
pub fn check_funds(price_microalgos: u64, balance_microalgos: u64) -> Result<(), Shortfall> {
    let required = required_microalgos(price_microalgos);
    if balance_microalgos < required {
        return Err(Shortfall {
            required_microalgos: required,
            available_microalgos: balance_microalgos,
            deficit_microalgos: required - balance_microalgos,
        });
    }
    Ok(())
}

/// What a purchase will cost and whether the buyer's snapshot covers it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PurchaseQuote {
    pub item_id: String,
    pub price_microalgos: u64,
    pub fee_microalgos: u64,
    pub min_balance_microalgos: u64,
    pub required_microalgos: u64,
    pub balance_microalgos: u64,
    /// Required balance formatted in ALGO
    pub required: String,
    /// Balance formatted in ALGO
    pub balance: String,
    pub can_afford: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Shortfall>,
}

impl PurchaseQuote {
    pub fn new(item: &Item, balance_microalgos: u64) -> Self {
        let price_microalgos = algos_to_microalgos(item.price);
        let required = required_microalgos(price_microalgos);
        let shortfall = check_funds(price_microalgos, balance_microalgos).err();
        Self {
            item_id: item.id.clone(),
            price_microalgos,
            fee_microalgos: NETWORK_FEE_MICROALGOS,
            min_balance_microalgos: MIN_BALANCE_MICROALGOS,
            required_microalgos: required,
            balance_microalgos,
            required: format_algos(required),
            balance: format_algos(balance_microalgos),
            can_afford: shortfall.is_none(),
            shortfall,
        }
    }
}
