// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the local redb file | `./data` |
//! | `ALGOD_URL` | Algorand node endpoint | `https://testnet-api.algonode.cloud` |
//! | `ALGOD_TOKEN` | Node API token (sent as `X-Algo-API-Token`) | Optional |
//! | `STORE_BACKEND` | `firestore` or `memory` | `firestore` |
//! | `FIRESTORE_PROJECT_ID` | Document database project | Required for `firestore` |
//! | `FIRESTORE_API_KEY` | Document database API key | Required for `firestore` |
//! | `FIRESTORE_BASE_URL` | Document database REST endpoint | `https://firestore.googleapis.com/v1` |
//! | `WALLET_BRIDGE_URL` | Wallet signing bridge | `http://127.0.0.1:8787` |
//! | `CLOUDINARY_CLOUD_NAME` | Image host account | Optional (uploads disabled) |
//! | `CLOUDINARY_UPLOAD_PRESET` | Unsigned upload preset | Optional (uploads disabled) |
//! | `FALLBACK_SELLER_ADDRESS` | Receiver for listings without a seller address | Built-in |
//! | `LISTING_POLL_SECS` | Item list refresh interval | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use crate::listing_poller::DEFAULT_POLL_INTERVAL;
use crate::models::WalletAddress;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable name for the local data directory.
///
/// Holds `market.redb`, which stores the cached listing and the settlement
/// outbox. Nothing else is persisted locally.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const ALGOD_URL_ENV: &str = "ALGOD_URL";
pub const ALGOD_TOKEN_ENV: &str = "ALGOD_TOKEN";
pub const STORE_BACKEND_ENV: &str = "STORE_BACKEND";
pub const FIRESTORE_PROJECT_ID_ENV: &str = "FIRESTORE_PROJECT_ID";
pub const FIRESTORE_API_KEY_ENV: &str = "FIRESTORE_API_KEY";
pub const FIRESTORE_BASE_URL_ENV: &str = "FIRESTORE_BASE_URL";
pub const WALLET_BRIDGE_URL_ENV: &str = "WALLET_BRIDGE_URL";
pub const CLOUDINARY_CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const CLOUDINARY_UPLOAD_PRESET_ENV: &str = "CLOUDINARY_UPLOAD_PRESET";
pub const FALLBACK_SELLER_ADDRESS_ENV: &str = "FALLBACK_SELLER_ADDRESS";
pub const LISTING_POLL_SECS_ENV: &str = "LISTING_POLL_SECS";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_WALLET_BRIDGE_URL: &str = "http://127.0.0.1:8787";

/// Receiver used by checkout when a listing carries no seller address.
pub const DEFAULT_FALLBACK_SELLER_ADDRESS: &str =
    "HZ57J3K46JIJXILONBBZOHX6BKPXEM2VVXNRFSUED6DKFD5ZD24PMJ3MVA";

/// File name of the local database inside `DATA_DIR`.
pub const LOCAL_DB_FILE: &str = "market.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Which document store implementation to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore {
        base_url: String,
        project_id: String,
        api_key: String,
    },
    /// Process-local store for demos and tests. Data is lost on exit.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub algod_url: String,
    pub algod_token: Option<String>,
    pub store: StoreBackend,
    pub wallet_bridge_url: String,
    pub cloudinary: Option<CloudinaryConfig>,
    pub fallback_seller: Option<WalletAddress>,
    pub listing_poll_interval: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let algod_url = get(ALGOD_URL_ENV)
            .unwrap_or_else(|| crate::blockchain::ALGORAND_TESTNET.algod_url.to_string());
        validate_url(ALGOD_URL_ENV, &algod_url)?;

        let store = match get(STORE_BACKEND_ENV).as_deref() {
            None | Some("firestore") => {
                let base_url = get(FIRESTORE_BASE_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string());
                validate_url(FIRESTORE_BASE_URL_ENV, &base_url)?;
                StoreBackend::Firestore {
                    base_url,
                    project_id: get(FIRESTORE_PROJECT_ID_ENV)
                        .ok_or(ConfigError::Missing(FIRESTORE_PROJECT_ID_ENV))?,
                    api_key: get(FIRESTORE_API_KEY_ENV)
                        .ok_or(ConfigError::Missing(FIRESTORE_API_KEY_ENV))?,
                }
            }
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: STORE_BACKEND_ENV,
                    reason: format!("expected `firestore` or `memory`, got `{other}`"),
                })
            }
        };

        let wallet_bridge_url =
            get(WALLET_BRIDGE_URL_ENV).unwrap_or_else(|| DEFAULT_WALLET_BRIDGE_URL.to_string());
        validate_url(WALLET_BRIDGE_URL_ENV, &wallet_bridge_url)?;

        let cloudinary = match (
            get(CLOUDINARY_CLOUD_NAME_ENV),
            get(CLOUDINARY_UPLOAD_PRESET_ENV),
        ) {
            (Some(cloud_name), Some(upload_preset)) => Some(CloudinaryConfig {
                cloud_name,
                upload_preset,
            }),
            _ => None,
        };

        let fallback_raw = get(FALLBACK_SELLER_ADDRESS_ENV)
            .unwrap_or_else(|| DEFAULT_FALLBACK_SELLER_ADDRESS.to_string());
        let fallback_seller = if fallback_raw.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(
                WalletAddress::parse(&fallback_raw).map_err(|reason| ConfigError::Invalid {
                    name: FALLBACK_SELLER_ADDRESS_ENV,
                    reason,
                })?,
            )
        };

        let listing_poll_interval = match get(LISTING_POLL_SECS_ENV) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: LISTING_POLL_SECS_ENV,
                    reason: e.to_string(),
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            algod_url,
            algod_token: get(ALGOD_TOKEN_ENV),
            store,
            wallet_bridge_url,
            cloudinary,
            fallback_seller,
            listing_poll_interval,
            log_format,
        })
    }

    pub fn local_db_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_DB_FILE)
    }
}

fn validate_url(name: &'static str, raw: &str) -> Result<(), ConfigError> {
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}
