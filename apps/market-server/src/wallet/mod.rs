// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Session
//!
//! The user's keys never reach this process. A [`WalletConnector`] talks to
//! the wallet (through the signing bridge in production) and the
//! [`WalletSession`] value records which account is connected.
//!
//! Sessions are values: `connect` and `disconnect` return a new session
//! instead of mutating shared state, and callers decide where to keep it.

pub mod bridge;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::blockchain::{ChainError, PaymentTransaction, TransactionSigner};
use crate::models::WalletAddress;

pub use bridge::WalletBridgeClient;

/// Wallet-side operations, as exposed by the wallet-connect library.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Start the interactive connect flow; returns the approved accounts.
    async fn connect(&self) -> Result<Vec<String>, WalletError>;

    /// Resume a session persisted by the wallet library.
    async fn reconnect_session(&self) -> Result<Vec<String>, WalletError>;

    /// Ask the user to sign a payment; returns signed transaction bytes.
    async fn sign_transaction(&self, txn: &PaymentTransaction) -> Result<Vec<u8>, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Wallet connection was rejected")]
    ConnectionRejected,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("No wallet session to restore")]
    NoSession,

    #[error("Signature request was cancelled")]
    Cancelled,

    #[error("Wallet bridge request failed: {0}")]
    Bridge(String),

    #[error("Invalid wallet response: {0}")]
    InvalidResponse(String),
}

/// The connected account, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    address: Option<WalletAddress>,
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: WalletAddress) -> Self {
        Self {
            address: Some(address),
        }
    }

    pub fn address(&self) -> Option<&WalletAddress> {
        self.address.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn require_address(&self) -> Result<&WalletAddress, WalletError> {
        self.address.as_ref().ok_or(WalletError::NotConnected)
    }

    /// Resume the wallet library's persisted session. Any failure, including
    /// there being no prior session, yields a disconnected session.
    pub async fn restore(connector: &dyn WalletConnector) -> Self {
        match connector.reconnect_session().await.and_then(first_account) {
            Ok(address) => {
                info!(address = %address.short(), "Restored wallet session");
                Self::connected(address)
            }
            Err(_) => Self::disconnected(),
        }
    }

    /// Run the connect flow and return a session for the first account.
    pub async fn connect(&self, connector: &dyn WalletConnector) -> Result<Self, WalletError> {
        let accounts = connector.connect().await.inspect_err(|e| {
            warn!(error = %e, "Failed to connect wallet");
        })?;
        let address = first_account(accounts)?;
        info!(address = %address.short(), "Wallet connected");
        Ok(Self::connected(address))
    }

    /// Tear down the library session. Never fails; bridge errors are logged.
    pub async fn disconnect(&self, connector: &dyn WalletConnector) -> Self {
        if let Err(e) = connector.disconnect().await {
            warn!(error = %e, "Wallet disconnect failed, clearing session anyway");
        }
        Self::disconnected()
    }

    /// Signer bound to this session's account.
    pub fn signer<'a>(
        &self,
        connector: &'a dyn WalletConnector,
    ) -> Result<SessionSigner<'a>, WalletError> {
        let address = self.require_address()?.clone();
        Ok(SessionSigner { connector, address })
    }
}

fn first_account(accounts: Vec<String>) -> Result<WalletAddress, WalletError> {
    let first = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
    WalletAddress::parse(&first).map_err(WalletError::InvalidResponse)
}

/// Routes payment signing through the wallet for one account.
pub struct SessionSigner<'a> {
    connector: &'a dyn WalletConnector,
    address: WalletAddress,
}

#[async_trait]
impl TransactionSigner for SessionSigner<'_> {
    async fn sign_payment(&self, txn: &PaymentTransaction) -> Result<Vec<u8>, ChainError> {
        if txn.sender != self.address.as_str() {
            return Err(ChainError::Signing(format!(
                "sender {} is not the connected account",
                txn.sender
            )));
        }
        self.connector
            .sign_transaction(txn)
            .await
            .map_err(|e| match e {
                WalletError::Cancelled => ChainError::SignatureCancelled,
                other => ChainError::Signing(other.to_string()),
            })
    }
}
