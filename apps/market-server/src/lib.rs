// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Campus Market - Peer-to-Peer Marketplace Server
//!
//! Students list items, browse them and pay each other in ALGO on the
//! Algorand TestNet. Keys stay in the user's wallet; this service builds the
//! payment, has the wallet sign it, waits for confirmation and records the
//! order.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Algorand node client and payment transactions
//! - `catalog` - Cached available-items listing
//! - `checkout` - Purchase flow and settlement outbox
//! - `store` - Document database (items, orders, profiles)
//! - `storage` - Local redb cache and in-process quote cache
//! - `wallet` - Wallet session and signing bridge

pub mod api;
pub mod blockchain;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod listing_poller;
pub mod media;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod wallet;

#[cfg(test)]
mod testing;
