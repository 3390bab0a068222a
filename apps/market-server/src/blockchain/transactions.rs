// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment transaction building.
//!
//! Transactions are described here in a wallet-neutral form. The wallet
//! encodes and signs them; this module never touches key material.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::client::ChainError;
use super::types::SuggestedParams;

/// Prefix of the note attached to every purchase payment.
pub const PAYMENT_NOTE_PREFIX: &str = "CampusMarket:buy:";

/// Rounds a transaction stays valid after the suggested first round.
pub const VALIDITY_WINDOW_ROUNDS: u64 = 1_000;

/// Note bytes identifying the purchased item.
pub fn purchase_note(item_id: &str) -> Vec<u8> {
    format!("{PAYMENT_NOTE_PREFIX}{item_id}").into_bytes()
}

/// A payment from one account to another.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub sender: String,
    pub receiver: String,
    pub amount_microalgos: u64,
    pub note: Vec<u8>,
}

/// Unsigned `pay` transaction handed to the wallet for signing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentTransaction {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub sender: String,
    pub receiver: String,
    /// Amount in microALGO
    pub amount: u64,
    /// Flat fee in microALGO
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    /// Base64 genesis hash
    pub genesis_hash: String,
    /// Base64 note bytes
    pub note: String,
}

impl PaymentTransaction {
    /// Build a payment against freshly fetched network parameters.
    pub fn build(request: &PaymentRequest, params: &SuggestedParams) -> Self {
        Self {
            tx_type: "pay".to_string(),
            sender: request.sender.clone(),
            receiver: request.receiver.clone(),
            amount: request.amount_microalgos,
            fee: params.min_fee,
            first_valid: params.last_round,
            last_valid: params.last_round + VALIDITY_WINDOW_ROUNDS,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash.clone(),
            note: BASE64.encode(&request.note),
        }
    }

    pub fn note_bytes(&self) -> Vec<u8> {
        BASE64.decode(&self.note).unwrap_or_default()
    }
}

/// Anything that can turn a payment into signed transaction bytes.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_payment(&self, txn: &PaymentTransaction) -> Result<Vec<u8>, ChainError>;
}
