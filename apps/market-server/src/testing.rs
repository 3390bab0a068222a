// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process fakes of the ledger node, the wallet and a failing document
//! store, shared by unit tests across modules, plus a router harness for
//! the HTTP handlers.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::blockchain::{
    AccountInformation, AlgodApi, ChainError, NodeStatus, PaymentTransaction, PendingTransaction,
    SuggestedParams, TransactionSigner, MIN_BALANCE_MICROALGOS,
};
use crate::blockchain::{ChainClient, ALGORAND_TESTNET};
use crate::models::{
    Item, ItemStatus, NewItem, NewOrder, Order, Profile, ProfileFields, WalletAddress,
};
use crate::state::AppState;
use crate::storage::LocalDb;
use crate::store::{DocumentStore, InMemoryStore, StoreError, StoreResult};
use crate::wallet::{WalletConnector, WalletError, WalletSession};

pub const BUYER: &str = "GD64YIY3TWGDMCNPP553DZPPR6LDUSFQOIJVFDPPXWEG3FVOJCCDBBHU5A";
pub const SELLER: &str = "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJI";

// =============================================================================
// Ledger node
// =============================================================================

/// Algod fake. Transactions confirm once the pending endpoint has been
/// polled `confirm_after` times in total; by default they never confirm.
pub struct FakeAlgod {
    balance: AtomicU64,
    last_round: AtomicU64,
    confirm_after: Option<usize>,
    pool_error: Option<String>,
    polls: AtomicUsize,
    submitted: Mutex<Vec<String>>,
}

impl FakeAlgod {
    pub fn new() -> Self {
        Self {
            balance: AtomicU64::new(0),
            last_round: AtomicU64::new(40_000),
            confirm_after: None,
            pool_error: None,
            polls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balance(self, microalgos: u64) -> Self {
        self.balance.store(microalgos, Ordering::SeqCst);
        self
    }

    pub fn confirm_after_polls(mut self, polls: usize) -> Self {
        self.confirm_after = Some(polls);
        self
    }

    pub fn with_pool_error(mut self, message: &str) -> Self {
        self.pool_error = Some(message.to_string());
        self
    }

    pub fn set_balance(&self, microalgos: u64) {
        self.balance.store(microalgos, Ordering::SeqCst);
    }

    pub fn last_tx_id(&self) -> Option<String> {
        self.submitted.lock().unwrap().last().cloned()
    }

    pub fn pending_polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlgodApi for FakeAlgod {
    async fn account_information(&self, address: &str) -> Result<AccountInformation, ChainError> {
        // Suspend like a real round trip so concurrent checkouts interleave.
        tokio::task::yield_now().await;
        Ok(AccountInformation {
            address: address.to_string(),
            amount: self.balance.load(Ordering::SeqCst),
            min_balance: MIN_BALANCE_MICROALGOS,
        })
    }

    async fn transaction_params(&self) -> Result<SuggestedParams, ChainError> {
        Ok(SuggestedParams {
            fee: 0,
            min_fee: 1_000,
            last_round: self.last_round.load(Ordering::SeqCst),
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=".to_string(),
            consensus_version: String::new(),
        })
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, ChainError> {
        if signed.is_empty() {
            return Err(ChainError::Node {
                status: 400,
                message: "empty transaction".to_string(),
            });
        }
        let mut submitted = self.submitted.lock().unwrap();
        let tx_id = format!("FAKETX{:04}", submitted.len() + 1);
        submitted.push(tx_id.clone());
        Ok(tx_id)
    }

    async fn pending_transaction(&self, _tx_id: &str) -> Result<PendingTransaction, ChainError> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(message) = &self.pool_error {
            return Ok(PendingTransaction {
                confirmed_round: None,
                pool_error: message.clone(),
            });
        }
        match self.confirm_after {
            Some(after) if polls >= after => Ok(PendingTransaction {
                confirmed_round: Some(self.last_round.load(Ordering::SeqCst)),
                pool_error: String::new(),
            }),
            _ => Ok(PendingTransaction::default()),
        }
    }

    async fn status(&self) -> Result<NodeStatus, ChainError> {
        Ok(NodeStatus {
            last_round: self.last_round.load(Ordering::SeqCst),
        })
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, ChainError> {
        tokio::task::yield_now().await;
        self.last_round.store(round + 1, Ordering::SeqCst);
        Ok(NodeStatus {
            last_round: round + 1,
        })
    }
}

// =============================================================================
// Signers
// =============================================================================

#[derive(Default)]
pub struct FakeSigner {
    cancel: bool,
    signed: Mutex<Vec<PaymentTransaction>>,
}

impl FakeSigner {
    pub fn cancelling() -> Self {
        Self {
            cancel: true,
            ..Default::default()
        }
    }

    pub fn signed(&self) -> Vec<PaymentTransaction> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSigner for FakeSigner {
    async fn sign_payment(&self, txn: &PaymentTransaction) -> Result<Vec<u8>, ChainError> {
        if self.cancel {
            return Err(ChainError::SignatureCancelled);
        }
        self.signed.lock().unwrap().push(txn.clone());
        Ok(serde_json::to_vec(txn).unwrap())
    }
}

/// Wallet-connect fake. Signing returns the transaction JSON as the
/// "signed" bytes.
#[derive(Default)]
pub struct FakeWallet {
    accounts: Vec<String>,
    reject: bool,
    fail_disconnect: bool,
    cancel_signatures: bool,
    signed: Mutex<Vec<PaymentTransaction>>,
    disconnects: AtomicUsize,
}

impl FakeWallet {
    pub fn with_accounts(accounts: &[&str]) -> Self {
        Self {
            accounts: accounts.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    /// The user declines every connect request and there is no session.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn cancelling_signatures(mut self) -> Self {
        self.cancel_signatures = true;
        self
    }

    pub fn signed(&self) -> Vec<PaymentTransaction> {
        self.signed.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletConnector for FakeWallet {
    async fn connect(&self) -> Result<Vec<String>, WalletError> {
        if self.reject {
            return Err(WalletError::ConnectionRejected);
        }
        Ok(self.accounts.clone())
    }

    async fn reconnect_session(&self) -> Result<Vec<String>, WalletError> {
        if self.reject || self.accounts.is_empty() {
            return Err(WalletError::NoSession);
        }
        Ok(self.accounts.clone())
    }

    async fn sign_transaction(&self, txn: &PaymentTransaction) -> Result<Vec<u8>, WalletError> {
        if self.cancel_signatures {
            return Err(WalletError::Cancelled);
        }
        self.signed.lock().unwrap().push(txn.clone());
        Ok(serde_json::to_vec(txn).unwrap())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_disconnect {
            return Err(WalletError::Bridge("bridge unreachable".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Document store
// =============================================================================

/// [`InMemoryStore`] with switchable write failures.
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_orders: AtomicBool,
    fail_item_updates: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_orders: AtomicBool::new(false),
            fail_item_updates: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn fail_item_updates(&self, fail: bool) {
        self.fail_item_updates.store(fail, Ordering::SeqCst);
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::Rejected {
        status: 503,
        message: format!("injected {what} failure"),
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn add_item(&self, item: NewItem) -> StoreResult<Item> {
        self.inner.add_item(item).await
    }

    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>> {
        self.inner.get_item(id).await
    }

    async fn list_items_by_status(&self, status: ItemStatus) -> StoreResult<Vec<Item>> {
        self.inner.list_items_by_status(status).await
    }

    async fn list_items_by_seller(&self, seller: &str) -> StoreResult<Vec<Item>> {
        self.inner.list_items_by_seller(seller).await
    }

    async fn update_item_status(&self, id: &str, status: ItemStatus) -> StoreResult<()> {
        if self.fail_item_updates.load(Ordering::SeqCst) {
            return Err(injected("item update"));
        }
        self.inner.update_item_status(id, status).await
    }

    async fn add_order(&self, order: NewOrder) -> StoreResult<Order> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(injected("order write"));
        }
        self.inner.add_order(order).await
    }

    async fn list_orders_by_buyer(&self, buyer: &str) -> StoreResult<Vec<Order>> {
        self.inner.list_orders_by_buyer(buyer).await
    }

    async fn list_orders_by_seller(&self, seller: &str) -> StoreResult<Vec<Order>> {
        self.inner.list_orders_by_seller(seller).await
    }

    async fn get_profile(&self, address: &str) -> StoreResult<Option<Profile>> {
        self.inner.get_profile(address).await
    }

    async fn save_profile(&self, address: &str, fields: ProfileFields) -> StoreResult<Profile> {
        self.inner.save_profile(address, fields).await
    }
}

// =============================================================================
// Router harness
// =============================================================================

/// Application state over fakes, with a temp dir holding the local db.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub algod: Arc<FakeAlgod>,
    pub wallet: Arc<FakeWallet>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(algod: FakeAlgod, wallet: FakeWallet) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(LocalDb::open(&dir.path().join("market.redb")).unwrap());
        let store = Arc::new(InMemoryStore::new());
        let algod = Arc::new(algod);
        let wallet = Arc::new(wallet);
        let state = AppState::new(
            store.clone(),
            ChainClient::new(algod.clone(), ALGORAND_TESTNET),
            wallet.clone(),
            db,
            Some(WalletAddress::from(SELLER)),
        )
        .with_data_dir(dir.path().to_path_buf());
        Self {
            state,
            store,
            algod,
            wallet,
            _dir: dir,
        }
    }

    /// Harness whose session is already connected as `address`.
    pub async fn connected_as(address: &str, algod: FakeAlgod) -> Self {
        let app = Self::new(algod, FakeWallet::with_accounts(&[address]));
        app.state
            .set_session(WalletSession::connected(WalletAddress::from(address)))
            .await;
        app
    }

    pub fn router(&self) -> Router {
        crate::api::router(self.state.clone())
    }

    /// Send one request through a fresh router and decode the JSON reply.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        call(self.router(), request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }
}

pub async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// A listing owned by `seller`, inserted with a fixed id.
pub async fn seed_item(store: &InMemoryStore, id: &str, seller: &str, price: f64) -> Item {
    store
        .insert_item(
            NewItem {
                title: format!("Listing {id}"),
                description: String::new(),
                price,
                category: crate::models::Category::Books,
                image_url: format!("https://img/{id}.png"),
                seller_address: seller.to_string(),
                seller_name: "Meera".to_string(),
                seller_roll: "20AR007".to_string(),
                seller_phone: String::new(),
                pickup_location: "Library steps".to_string(),
            }
            .into_item(id.to_string(), chrono::Utc::now()),
        )
        .await
}
