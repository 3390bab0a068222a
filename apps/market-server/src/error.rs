// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::ChainError;
use crate::checkout::{CheckoutError, SettlementError};
use crate::media::MediaError;
use crate::storage::LocalDbError;
use crate::store::StoreError;
use crate::wallet::WalletError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            other => ApiError::service_unavailable(format!("Document store unavailable: {other}")),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::NotConnected => ApiError::unauthorized("Connect your wallet first"),
            WalletError::ConnectionRejected => {
                ApiError::bad_request("Wallet connection was rejected")
            }
            WalletError::Cancelled => ApiError::bad_request("Transaction was cancelled."),
            WalletError::NoAccounts => ApiError::unprocessable("Wallet returned no accounts"),
            other => ApiError::bad_gateway(format!("Wallet bridge error: {other}")),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(e: ChainError) -> Self {
        ApiError::service_unavailable(format!("Ledger node unavailable: {e}"))
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotConfigured => ApiError::service_unavailable("Image uploads are disabled"),
            MediaError::Rejected(msg) => ApiError::bad_gateway(format!("Upload failed: {msg}")),
            other => ApiError::bad_gateway(format!("Could not upload image: {other}")),
        }
    }
}

impl From<LocalDbError> for ApiError {
    fn from(e: LocalDbError) -> Self {
        ApiError::internal(format!("Local database error: {e}"))
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        let message = e.to_string();
        match e {
            CheckoutError::WalletNotConnected => ApiError::unauthorized(message),
            CheckoutError::MissingBuyerDetails | CheckoutError::UserCancelled => {
                ApiError::bad_request(message)
            }
            CheckoutError::ItemNotFound(_) => ApiError::not_found(message),
            CheckoutError::ItemNotAvailable(_) => ApiError::conflict(message),
            CheckoutError::MissingSellerAddress | CheckoutError::InsufficientFunds(_) => {
                ApiError::unprocessable(message)
            }
            CheckoutError::ConfirmationTimeout { .. } => ApiError::gateway_timeout(message),
            CheckoutError::PaymentNotRecorded { .. } => ApiError::internal(message),
            CheckoutError::Network(_) => ApiError::service_unavailable(message),
        }
    }
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        let message = e.to_string();
        match e {
            SettlementError::NotFound(_) => ApiError::not_found(message),
            SettlementError::Store { .. } => ApiError::service_unavailable(message),
            SettlementError::LocalDb(_) => ApiError::internal(message),
        }
    }
}
