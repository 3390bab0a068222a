// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration module for the Algorand TestNet.
//!
//! This module provides functionality for:
//! - Querying native ALGO balances
//! - Building payment transactions for the wallet to sign
//! - Submitting signed payments and waiting for confirmation

pub mod client;
pub mod transactions;
pub mod types;

pub use client::{AlgodApi, AlgodClient, ChainClient, ChainError};
pub use transactions::{
    purchase_note, PaymentRequest, PaymentTransaction, TransactionSigner, PAYMENT_NOTE_PREFIX,
};
pub use types::*;
