// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Algorand node client for balance lookups and payment submission.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};

use super::transactions::{PaymentRequest, PaymentTransaction, TransactionSigner};
use super::types::*;

/// Raw node API surface used by [`ChainClient`].
#[async_trait]
pub trait AlgodApi: Send + Sync {
    async fn account_information(&self, address: &str) -> Result<AccountInformation, ChainError>;

    async fn transaction_params(&self) -> Result<SuggestedParams, ChainError>;

    /// Submit signed transaction bytes; returns the node-assigned tx id.
    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, ChainError>;

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransaction, ChainError>;

    async fn status(&self) -> Result<NodeStatus, ChainError>;

    /// Block until the node has seen a block after `round`.
    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, ChainError>;
}

/// HTTP client for an algod node (`/v2` REST API).
#[derive(Debug, Clone)]
pub struct AlgodClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct NodeErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SendRawResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

impl AlgodClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ChainError> {
        url::Url::parse(base_url).map_err(|e| ChainError::InvalidRpcUrl(e.to_string()))?;

        // Must outlast a wait-for-block call (one round is ~3s on testnet).
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ChainError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.header("X-Algo-API-Token", token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChainError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| ChainError::Request(e.to_string()))?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ChainError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<NodeErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        return Err(classify_node_error(status.as_u16(), message));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ChainError::InvalidResponse(e.to_string()))
}

/// Map a node rejection onto the error taxonomy. Overspends and minimum
/// balance violations both mean the buyer cannot afford the payment.
pub fn classify_node_error(status: u16, message: String) -> ChainError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("overspend") || lower.contains("below min") {
        ChainError::Overspend(message)
    } else {
        ChainError::Node { status, message }
    }
}

#[async_trait]
impl AlgodApi for AlgodClient {
    async fn account_information(&self, address: &str) -> Result<AccountInformation, ChainError> {
        self.get_json(&format!("/v2/accounts/{address}?exclude=all"))
            .await
    }

    async fn transaction_params(&self) -> Result<SuggestedParams, ChainError> {
        self.get_json("/v2/transactions/params").await
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, ChainError> {
        let response = self
            .request(Method::POST, "/v2/transactions")
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(signed.to_vec())
            .send()
            .await
            .map_err(|e| ChainError::Request(e.to_string()))?;
        let body: SendRawResponse = decode_response(response).await?;
        Ok(body.tx_id)
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransaction, ChainError> {
        self.get_json(&format!("/v2/transactions/pending/{tx_id}?format=json"))
            .await
    }

    async fn status(&self) -> Result<NodeStatus, ChainError> {
        self.get_json("/v2/status").await
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, ChainError> {
        self.get_json(&format!("/v2/status/wait-for-block-after/{round}"))
            .await
    }
}

/// Ledger operations used by the marketplace.
#[derive(Clone)]
pub struct ChainClient {
    api: Arc<dyn AlgodApi>,
    network: NetworkConfig,
}

impl ChainClient {
    pub fn new(api: Arc<dyn AlgodApi>, network: NetworkConfig) -> Self {
        Self { api, network }
    }

    /// Client for Algorand TestNet through the given node.
    pub fn testnet(algod_url: &str, token: Option<String>) -> Result<Self, ChainError> {
        let api = AlgodClient::new(algod_url, token)?;
        Ok(Self::new(Arc::new(api), ALGORAND_TESTNET))
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Latest round the node has seen.
    pub async fn last_round(&self) -> Result<u64, ChainError> {
        Ok(self.api.status().await?.last_round)
    }

    /// Balance in microALGO. Lookup failures are logged and read as zero.
    pub async fn get_balance_microalgos(&self, address: &str) -> u64 {
        match self.api.account_information(address).await {
            Ok(info) => info.amount,
            Err(e) => {
                warn!(address = %address, error = %e, "Could not fetch balance");
                0
            }
        }
    }

    /// Balance in ALGO. Lookup failures are logged and read as zero.
    pub async fn get_balance(&self, address: &str) -> f64 {
        microalgos_to_algos(self.get_balance_microalgos(address).await)
    }

    /// Build, sign, submit and confirm a payment. Returns the transaction id
    /// only once the node reports it confirmed.
    pub async fn submit_payment(
        &self,
        request: PaymentRequest,
        signer: &dyn TransactionSigner,
    ) -> Result<String, ChainError> {
        let params = self.api.transaction_params().await?;
        let txn = PaymentTransaction::build(&request, &params);

        let signed = signer.sign_payment(&txn).await?;
        let tx_id = self.api.send_raw_transaction(&signed).await?;
        info!(
            tx_id = %tx_id,
            sender = %request.sender,
            receiver = %request.receiver,
            amount = request.amount_microalgos,
            "Payment submitted, waiting for confirmation"
        );

        let confirmed = self.wait_for_confirmation(&tx_id).await?;
        info!(
            tx_id = %tx_id,
            round = confirmed.confirmed_round.unwrap_or_default(),
            "Payment confirmed"
        );
        Ok(tx_id)
    }

    /// Poll for confirmation for [`CONFIRMATION_ROUNDS`] rounds.
    pub async fn wait_for_confirmation(&self, tx_id: &str) -> Result<PendingTransaction, ChainError> {
        let status = self.api.status().await?;
        let start_round = status.last_round + 1;
        let mut current_round = start_round;

        while current_round < start_round + CONFIRMATION_ROUNDS {
            match self.api.pending_transaction(tx_id).await {
                Ok(pending) if pending.is_confirmed() => return Ok(pending),
                Ok(pending) if !pending.pool_error.is_empty() => {
                    return Err(match classify_node_error(400, pending.pool_error) {
                        ChainError::Node { message, .. } => ChainError::PoolRejected(message),
                        other => other,
                    });
                }
                Ok(_) => {}
                // Not yet visible to this node.
                Err(ChainError::Node { status: 404, .. }) => {}
                Err(e) => return Err(e),
            }

            debug!(tx_id = %tx_id, round = current_round, "Waiting for next block");
            self.api.status_after_block(current_round).await?;
            current_round += 1;
        }

        Err(ChainError::ConfirmationTimeout {
            tx_id: tx_id.to_string(),
            rounds: CONFIRMATION_ROUNDS,
        })
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid node URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Request to node failed: {0}")]
    Request(String),

    #[error("Node returned {status}: {message}")]
    Node { status: u16, message: String },

    #[error("Insufficient funds: {0}")]
    Overspend(String),

    #[error("Transaction rejected by pool: {0}")]
    PoolRejected(String),

    #[error("Invalid node response: {0}")]
    InvalidResponse(String),

    #[error("Transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    #[error("Signature request was cancelled")]
    SignatureCancelled,

    #[error("Signing failed: {0}")]
    Signing(String),
}
