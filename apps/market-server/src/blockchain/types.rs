// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Algorand network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Genesis id reported by the node
    pub genesis_id: &'static str,
    /// Public node endpoint (no API token needed)
    pub algod_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Algorand TestNet configuration.
pub const ALGORAND_TESTNET: NetworkConfig = NetworkConfig {
    name: "Algorand TestNet",
    genesis_id: "testnet-v1.0",
    algod_url: "https://testnet-api.algonode.cloud",
    explorer_url: "https://testnet.explorer.perawallet.app",
};

impl NetworkConfig {
    /// Explorer page for a transaction id.
    pub fn explorer_tx_url(&self, tx_id: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_id)
    }
}

/// 1 ALGO = 1,000,000 microALGO.
pub const MICROALGOS_PER_ALGO: u64 = 1_000_000;

/// Flat fee budgeted for one payment (0.001 ALGO).
pub const NETWORK_FEE_MICROALGOS: u64 = 1_000;

/// Balance an account must keep to stay open (0.1 ALGO).
pub const MIN_BALANCE_MICROALGOS: u64 = 100_000;

/// Rounds to wait for a submitted payment before giving up.
pub const CONFIRMATION_ROUNDS: u64 = 4;

/// Convert a display amount to microALGO, rounding to the nearest unit.
/// Negative and non-finite amounts convert to zero.
pub fn algos_to_microalgos(algos: f64) -> u64 {
    if !algos.is_finite() || algos <= 0.0 {
        return 0;
    }
    (algos * MICROALGOS_PER_ALGO as f64).round() as u64
}

pub fn microalgos_to_algos(microalgos: u64) -> f64 {
    microalgos as f64 / MICROALGOS_PER_ALGO as f64
}

/// Format a microALGO amount as ALGO without trailing zeros.
pub fn format_algos(microalgos: u64) -> String {
    let whole = microalgos / MICROALGOS_PER_ALGO;
    let remainder = microalgos % MICROALGOS_PER_ALGO;

    if remainder == 0 {
        return whole.to_string();
    }
    let decimal_str = format!("{:06}", remainder);
    format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
}

// =============================================================================
// Node response shapes
// =============================================================================

/// Subset of `GET /v2/accounts/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct AccountInformation {
    pub address: String,
    /// Balance in microALGO
    pub amount: u64,
    #[serde(default)]
    pub min_balance: u64,
}

/// `GET /v2/transactions/params`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SuggestedParams {
    /// Fee per byte in microALGO
    #[serde(default)]
    pub fee: u64,
    pub min_fee: u64,
    pub last_round: u64,
    pub genesis_id: String,
    /// Base64 genesis hash
    pub genesis_hash: String,
    #[serde(default)]
    pub consensus_version: String,
}

/// Subset of `GET /v2/transactions/pending/{txid}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_round: Option<u64>,
    #[serde(default)]
    pub pool_error: String,
}

impl PendingTransaction {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some_and(|round| round > 0)
    }
}

/// Subset of `GET /v2/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

/// Balance as shown to the buyer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AccountBalance {
    pub address: String,
    pub network: String,
    pub balance_microalgos: u64,
    /// Balance formatted in ALGO
    pub balance: String,
}

impl AccountBalance {
    pub fn new(address: &str, network: &NetworkConfig, microalgos: u64) -> Self {
        Self {
            address: address.to_string(),
            network: network.name.to_string(),
            balance_microalgos: microalgos,
            balance: format_algos(microalgos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_units() {
        assert_eq!(algos_to_microalgos(1.0), 1_000_000);
        assert_eq!(algos_to_microalgos(0.1), 100_000);
        // 0.1 + 0.2 style float noise is rounded away
        assert_eq!(algos_to_microalgos(2.3), 2_300_000);
        assert_eq!(algos_to_microalgos(-5.0), 0);
        assert_eq!(algos_to_microalgos(f64::NAN), 0);
        assert_eq!(microalgos_to_algos(1_500_000), 1.5);
    }

    #[test]
    fn formats_algos() {
        assert_eq!(format_algos(0), "0");
        assert_eq!(format_algos(5_000_000), "5");
        assert_eq!(format_algos(1_500_000), "1.5");
        assert_eq!(format_algos(101_000), "0.101");
        assert_eq!(format_algos(1), "0.000001");
    }

    #[test]
    fn parses_node_payloads() {
        let params: SuggestedParams = serde_json::from_str(
            r#"{"consensus-version":"future","fee":0,"genesis-hash":"SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=","genesis-id":"testnet-v1.0","last-round":4500,"min-fee":1000}"#,
        )
        .unwrap();
        assert_eq!(params.min_fee, 1000);
        assert_eq!(params.last_round, 4500);

        let pending: PendingTransaction =
            serde_json::from_str(r#"{"confirmed-round":4502,"pool-error":""}"#).unwrap();
        assert!(pending.is_confirmed());

        let pending: PendingTransaction = serde_json::from_str(r#"{"pool-error":""}"#).unwrap();
        assert!(!pending.is_confirmed());
    }

    #[test]
    fn explorer_url() {
        assert_eq!(
            ALGORAND_TESTNET.explorer_tx_url("ABC"),
            "https://testnet.explorer.perawallet.app/tx/ABC"
        );
    }
}
