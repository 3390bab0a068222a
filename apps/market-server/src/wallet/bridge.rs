// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the wallet signing bridge.
//!
//! The bridge is a small sidecar that runs the wallet-connect session with
//! the user's mobile wallet and relays connect, sign and disconnect requests.
//!
//! | Operation | Request | Success body |
//! |-----------|---------|--------------|
//! | connect | `POST /v1/session/connect` | `{"accounts": [..]}` |
//! | reconnect | `GET /v1/session` | `{"accounts": [..]}` |
//! | sign | `POST /v1/session/sign` with `{"transactions": [txn]}` | `{"signed": ["<base64>"]}` |
//! | disconnect | `DELETE /v1/session` | empty |
//!
//! Failures carry `{"error": "...", "error_code": "..."}` where
//! `error_code` is one of `user_rejected`, `user_cancelled`, `no_session`.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::{WalletConnector, WalletError};
use crate::blockchain::PaymentTransaction;

#[derive(Debug, Clone)]
pub struct WalletBridgeClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_code: String,
}

impl WalletBridgeClient {
    pub fn new(base_url: &str) -> Result<Self, WalletError> {
        url::Url::parse(base_url).map_err(|e| WalletError::Bridge(e.to_string()))?;

        // Connect and sign wait on the user approving in their wallet app.
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| WalletError::Bridge(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, WalletError> {
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| WalletError::InvalidResponse(e.to_string()))
}

async fn check_status(response: Response) -> Result<Response, WalletError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let parsed: Option<BridgeErrorBody> = serde_json::from_str(&body).ok();
    Err(match parsed {
        Some(err) => map_error_code(&err.error_code, err.error),
        None => WalletError::Bridge(format!("{status}: {body}")),
    })
}

fn map_error_code(code: &str, message: String) -> WalletError {
    match code {
        "user_rejected" => WalletError::ConnectionRejected,
        "user_cancelled" => WalletError::Cancelled,
        "no_session" => WalletError::NoSession,
        _ => WalletError::Bridge(message),
    }
}

fn transport(e: reqwest::Error) -> WalletError {
    WalletError::Bridge(e.to_string())
}

#[async_trait]
impl WalletConnector for WalletBridgeClient {
    async fn connect(&self) -> Result<Vec<String>, WalletError> {
        let response = self
            .http
            .post(self.url("/v1/session/connect"))
            .send()
            .await
            .map_err(transport)?;
        let body: AccountsResponse = decode(response).await?;
        Ok(body.accounts)
    }

    async fn reconnect_session(&self) -> Result<Vec<String>, WalletError> {
        let response = self
            .http
            .get(self.url("/v1/session"))
            .send()
            .await
            .map_err(transport)?;
        let body: AccountsResponse = decode(response).await?;
        Ok(body.accounts)
    }

    async fn sign_transaction(&self, txn: &PaymentTransaction) -> Result<Vec<u8>, WalletError> {
        let response = self
            .http
            .post(self.url("/v1/session/sign"))
            .json(&json!({ "transactions": [txn] }))
            .send()
            .await
            .map_err(transport)?;
        let body: SignResponse = decode(response).await?;
        let first = body
            .signed
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::InvalidResponse("no signed transaction".to_string()))?;
        BASE64
            .decode(first)
            .map_err(|e| WalletError::InvalidResponse(format!("signed transaction is not base64: {e}")))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let response = self
            .http
            .delete(self.url("/v1/session"))
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await.map(|_| ())
    }
}
