// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Checkout
//!
//! One purchase, composed from the wallet session, the ledger client and
//! the document store:
//!
//! 1. Resolve the seller address (item's own, else the fallback address).
//! 2. Check the buyer's balance snapshot covers price + fee + reserve.
//! 3. Have the wallet sign a payment with the item id in the note.
//! 4. Submit it and wait for confirmation.
//! 5. Mark the item sold.
//! 6. Record the order.
//!
//! Nothing is rolled back once the payment is signed. If step 5 or 6 fails
//! after the payment confirmed, the purchase is written to the settlement
//! outbox (see [`settlement`]) and reported as not recorded.
//!
//! Two buyers racing for one item are not coordinated: both payments can
//! confirm and both orders are written.

pub mod quote;
pub mod settlement;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::blockchain::{
    algos_to_microalgos, purchase_note, ChainClient, ChainError, PaymentRequest,
};
use crate::models::{Item, NewOrder, Order, OrderStatus, ProfileFields, WalletAddress};
use crate::storage::{LocalDb, QuoteCache};
use crate::store::{DocumentStore, StoreError};
use crate::wallet::{WalletConnector, WalletSession};

pub use quote::{check_funds, required_microalgos, PurchaseQuote, Shortfall};
pub use settlement::SettlementError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckoutError {
    #[error("Connect your wallet first")]
    WalletNotConnected,

    #[error("Please fill in your name and roll number.")]
    MissingBuyerDetails,

    #[error("Item not found.")]
    ItemNotFound(String),

    #[error("This item has already been sold.")]
    ItemNotAvailable(String),

    #[error("Seller address is missing from this listing")]
    MissingSellerAddress,

    /// `None` when the node rejected the payment rather than the local check.
    #[error("{}", insufficient_funds_message(.0))]
    InsufficientFunds(Option<Shortfall>),

    #[error("Transaction was cancelled.")]
    UserCancelled,

    #[error("Transaction {tx_id} was not confirmed in time. Check the explorer before retrying.")]
    ConfirmationTimeout { tx_id: String },

    #[error("Payment {tx_id} confirmed but the purchase could not be recorded: {reason}")]
    PaymentNotRecorded { tx_id: String, reason: String },

    #[error("Purchase failed: {0}")]
    Network(String),
}

fn insufficient_funds_message(shortfall: &Option<Shortfall>) -> String {
    match shortfall {
        Some(shortfall) => shortfall.message(),
        None => "Purchase failed. Make sure you have enough ALGO and try again.".to_string(),
    }
}

impl From<ChainError> for CheckoutError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::SignatureCancelled => CheckoutError::UserCancelled,
            ChainError::Overspend(_) => CheckoutError::InsufficientFunds(None),
            ChainError::ConfirmationTimeout { tx_id, .. } => {
                CheckoutError::ConfirmationTimeout { tx_id }
            }
            other => CheckoutError::Network(other.to_string()),
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => CheckoutError::ItemNotFound(what),
            other => CheckoutError::Network(other.to_string()),
        }
    }
}

/// Result of a completed purchase.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub tx_id: String,
    pub item_id: String,
    pub item_title: String,
    /// Price in ALGO
    pub price: f64,
    pub explorer_url: String,
}

#[derive(Clone)]
pub struct Checkout {
    store: Arc<dyn DocumentStore>,
    chain: ChainClient,
    db: Arc<LocalDb>,
    quotes: Arc<QuoteCache>,
    fallback_seller: Option<WalletAddress>,
}

impl Checkout {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        chain: ChainClient,
        db: Arc<LocalDb>,
        quotes: Arc<QuoteCache>,
        fallback_seller: Option<WalletAddress>,
    ) -> Self {
        Self {
            store,
            chain,
            db,
            quotes,
            fallback_seller,
        }
    }

    /// Item that can still be bought.
    async fn load_item(&self, item_id: &str) -> Result<Item, CheckoutError> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| CheckoutError::ItemNotFound(item_id.to_string()))?;
        if !item.is_available() {
            return Err(CheckoutError::ItemNotAvailable(item.id));
        }
        Ok(item)
    }

    /// The item's seller address, or the fallback when the listing has none.
    pub fn resolve_seller(&self, item: &Item) -> Result<String, CheckoutError> {
        match item.seller() {
            Some(seller) => Ok(seller.to_string()),
            None => self
                .fallback_seller
                .as_ref()
                .map(|addr| addr.to_string())
                .ok_or(CheckoutError::MissingSellerAddress),
        }
    }

    /// Fetch the buyer's balance and keep it as the snapshot checkout will
    /// use.
    pub async fn quote(
        &self,
        buyer: &WalletAddress,
        item_id: &str,
    ) -> Result<PurchaseQuote, CheckoutError> {
        let item = self.load_item(item_id).await?;
        let balance = self.chain.get_balance_microalgos(buyer.as_str()).await;
        self.quotes.put(buyer.as_str(), balance);
        Ok(PurchaseQuote::new(&item, balance))
    }

    /// Cached snapshot, fetched only when none is held.
    async fn balance_snapshot(&self, buyer: &WalletAddress) -> u64 {
        if let Some(balance) = self.quotes.get(buyer.as_str()) {
            return balance;
        }
        let balance = self.chain.get_balance_microalgos(buyer.as_str()).await;
        self.quotes.put(buyer.as_str(), balance);
        balance
    }

    /// Run the purchase of `item_id` by the session's account.
    pub async fn purchase(
        &self,
        session: &WalletSession,
        wallet: &dyn WalletConnector,
        item_id: &str,
        buyer: ProfileFields,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let buyer_address = session
            .address()
            .cloned()
            .ok_or(CheckoutError::WalletNotConnected)?;
        if !buyer.is_complete() {
            return Err(CheckoutError::MissingBuyerDetails);
        }

        let item = self.load_item(item_id).await?;

        let seller = self.resolve_seller(&item)?;
        let amount = algos_to_microalgos(item.price);

        let balance = self.balance_snapshot(&buyer_address).await;
        check_funds(amount, balance).map_err(|s| CheckoutError::InsufficientFunds(Some(s)))?;

        let buyer = self.remember_buyer(&buyer_address, buyer).await;

        let signer = session
            .signer(wallet)
            .map_err(|_| CheckoutError::WalletNotConnected)?;
        let request = PaymentRequest {
            sender: buyer_address.to_string(),
            receiver: seller.clone(),
            amount_microalgos: amount,
            note: purchase_note(&item.id),
        };
        let submitted = self.chain.submit_payment(request, &signer).await;
        // A timed-out payment may still confirm, so the snapshot is stale
        // whatever the outcome.
        self.quotes.invalidate(buyer_address.as_str());
        let tx_id = submitted?;

        let draft = NewOrder {
            buyer_address: buyer_address.to_string(),
            buyer_name: buyer.name,
            buyer_roll: buyer.roll_no,
            buyer_phone: buyer.phone,
            seller_address: seller,
            seller_name: item.seller_name.clone(),
            seller_roll: item.seller_roll.clone(),
            seller_phone: item.seller_phone.clone(),
            pickup_location: item.pickup_location.clone(),
            item_id: item.id.clone(),
            item_title: item.title.clone(),
            price: item.price,
            tx_id: tx_id.clone(),
            status: OrderStatus::Paid,
        };
        let order = self.settle(draft).await?;

        info!(
            order_id = %order.id,
            tx_id = %tx_id,
            item_id = %item.id,
            "Purchase complete"
        );
        Ok(self.receipt(&order))
    }

    /// Save the buyer's contact details, keeping stored values for fields
    /// left blank. Failures are logged; the purchase goes on.
    async fn remember_buyer(
        &self,
        address: &WalletAddress,
        submitted: ProfileFields,
    ) -> ProfileFields {
        let merged = match self.store.get_profile(address.as_str()).await {
            Ok(Some(existing)) => submitted.fill_blanks_from(&existing.fields()),
            Ok(None) => submitted,
            Err(e) => {
                warn!(address = %address.short(), error = %e, "Could not load buyer profile");
                return submitted;
            }
        };
        if let Err(e) = self
            .store
            .save_profile(address.as_str(), merged.clone())
            .await
        {
            warn!(address = %address.short(), error = %e, "Could not save buyer profile");
        }
        merged
    }

    pub fn receipt(&self, order: &Order) -> CheckoutReceipt {
        CheckoutReceipt {
            order_id: order.id.clone(),
            tx_id: order.tx_id.clone(),
            item_id: order.item_id.clone(),
            item_title: order.item_title.clone(),
            price: order.price,
            explorer_url: self.chain.network().explorer_tx_url(&order.tx_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ALGORAND_TESTNET;
    use crate::models::{Category, ItemStatus, NewItem};
    use crate::store::InMemoryStore;
    use crate::testing::{FakeAlgod, FakeWallet, FlakyStore, BUYER, SELLER};

    struct Harness {
        checkout: Checkout,
        store: Arc<FlakyStore>,
        algod: Arc<FakeAlgod>,
        db: Arc<LocalDb>,
        _dir: tempfile::TempDir,
    }

    fn harness(algod: FakeAlgod, fallback: Option<&str>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(LocalDb::open(&dir.path().join("market.redb")).unwrap());
        let store = Arc::new(FlakyStore::new(InMemoryStore::new()));
        let algod = Arc::new(algod);
        let chain = ChainClient::new(algod.clone(), ALGORAND_TESTNET);
        let checkout = Checkout::new(
            store.clone(),
            chain,
            db.clone(),
            Arc::new(QuoteCache::default()),
            fallback.map(WalletAddress::from),
        );
        Harness {
            checkout,
            store,
            algod,
            db,
            _dir: dir,
        }
    }

    fn listing(price: f64, seller: Option<&str>) -> Item {
        let mut item = NewItem {
            title: "Drawing board".to_string(),
            description: "A2 size".to_string(),
            price,
            category: Category::Other,
            image_url: "https://img/board.png".to_string(),
            seller_address: seller.unwrap_or_default().to_string(),
            seller_name: "Meera".to_string(),
            seller_roll: "20AR007".to_string(),
            seller_phone: "98450".to_string(),
            pickup_location: "Library steps".to_string(),
        }
        .into_item("item-1".to_string(), chrono::Utc::now());
        if seller.is_none() {
            item.seller_address = None;
        }
        item
    }

    fn buyer() -> ProfileFields {
        ProfileFields {
            name: "Kiran".to_string(),
            roll_no: "23EE042".to_string(),
            phone: String::new(),
            pickup_location: String::new(),
        }
    }

    fn session() -> WalletSession {
        WalletSession::connected(WalletAddress::from(BUYER))
    }

    #[tokio::test]
    async fn successful_purchase_records_one_order() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000).confirm_after_polls(1), None);
        h.store.inner().insert_item(listing(2.0, Some(SELLER))).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let receipt = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap();

        assert_eq!(Some(receipt.tx_id.clone()), h.algod.last_tx_id());
        assert!(receipt.explorer_url.ends_with(&receipt.tx_id));

        let item = h.store.get_item("item-1").await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Sold);

        let orders = h.store.list_orders_by_buyer(BUYER).await.unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.seller_address, SELLER);
        assert_eq!(order.item_title, "Drawing board");
        assert_eq!(order.price, 2.0);
        assert_eq!(order.buyer_name, "Kiran");
        assert_eq!(order.seller_name, "Meera");
        assert_eq!(order.status, OrderStatus::Paid);

        let signed = wallet.signed();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].amount, 2_000_000);
        assert_eq!(signed[0].receiver, SELLER);
        assert_eq!(signed[0].note_bytes(), b"CampusMarket:buy:item-1".to_vec());

        let profile = h.store.get_profile(BUYER).await.unwrap().unwrap();
        assert_eq!(profile.roll_no, "23EE042");
    }

    #[tokio::test]
    async fn absent_seller_uses_fallback_address() {
        let h = harness(
            FakeAlgod::new().with_balance(5_000_000).confirm_after_polls(1),
            Some(SELLER),
        );
        h.store.inner().insert_item(listing(1.0, None)).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        h.checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap();

        assert_eq!(wallet.signed()[0].receiver, SELLER);
    }

    #[tokio::test]
    async fn absent_seller_without_fallback_fails() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000), None);
        h.store.inner().insert_item(listing(1.0, None)).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingSellerAddress));
        assert!(wallet.signed().is_empty());
    }

    #[tokio::test]
    async fn insufficient_snapshot_blocks_before_signing() {
        // 2.100999 ALGO against a 2 ALGO item: one microALGO short.
        let h = harness(FakeAlgod::new().with_balance(2_100_999), None);
        h.store.inner().insert_item(listing(2.0, Some(SELLER))).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientFunds(Some(short)) => {
                assert_eq!(short.deficit_microalgos, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(wallet.signed().is_empty());
        assert!(h.algod.last_tx_id().is_none());
    }

    #[tokio::test]
    async fn checkout_uses_quoted_snapshot() {
        let h = harness(FakeAlgod::new().with_balance(0).confirm_after_polls(1), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        let buyer_address = WalletAddress::from(BUYER);

        let quote = h.checkout.quote(&buyer_address, "item-1").await.unwrap();
        assert!(!quote.can_afford);

        // Funds arriving after the quote are not seen until a new quote.
        h.algod.set_balance(10_000_000);
        let wallet = FakeWallet::with_accounts(&[BUYER]);
        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientFunds(Some(_))));

        let quote = h.checkout.quote(&buyer_address, "item-1").await.unwrap();
        assert!(quote.can_afford);
    }

    #[tokio::test]
    async fn preconditions_are_checked_first() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&WalletSession::disconnected(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::WalletNotConnected));

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", ProfileFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingBuyerDetails));

        let err = h
            .checkout
            .purchase(&session(), &wallet, "nope", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn sold_items_cannot_be_bought() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000), None);
        let mut item = listing(1.0, Some(SELLER));
        item.status = ItemStatus::Sold;
        h.store.inner().insert_item(item).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ItemNotAvailable(_)));
    }

    #[tokio::test]
    async fn cancelled_signature_is_classified() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]).cancelling_signatures();

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::UserCancelled));
        assert_eq!(err.to_string(), "Transaction was cancelled.");

        let item = h.store.get_item("item-1").await.unwrap().unwrap();
        assert!(item.is_available());
    }

    #[tokio::test]
    async fn unconfirmed_payment_times_out() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ConfirmationTimeout { .. }));
        assert!(h.store.list_orders_by_buyer(BUYER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_order_write_goes_to_outbox() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000).confirm_after_polls(1), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        h.store.fail_orders(true);
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        let tx_id = match err {
            CheckoutError::PaymentNotRecorded { tx_id, .. } => tx_id,
            other => panic!("unexpected error: {other:?}"),
        };

        let pending = h.db.get_settlement(&tx_id).unwrap().unwrap();
        assert_eq!(pending.item_id, "item-1");
        assert_eq!(pending.order.tx_id, tx_id);
        assert_eq!(
            pending.failed_step,
            crate::models::SettlementStep::RecordOrder
        );
    }

    #[tokio::test]
    async fn concurrent_purchases_are_not_guarded() {
        let h = harness(FakeAlgod::new().with_balance(50_000_000).confirm_after_polls(1), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        let wallet_a = FakeWallet::with_accounts(&[BUYER]);
        let wallet_b = FakeWallet::with_accounts(&[BUYER]);
        let session = session();

        let (a, b) = tokio::join!(
            h.checkout.purchase(&session, &wallet_a, "item-1", buyer()),
            h.checkout.purchase(&session, &wallet_b, "item-1", buyer()),
        );

        // Both checks ran before either write: two payments, two orders.
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(h.store.list_orders_by_buyer(BUYER).await.unwrap().len(), 2);
    }

    fn stored_profile() -> ProfileFields {
        ProfileFields {
            name: "Kiran".to_string(),
            roll_no: "23EE042".to_string(),
            phone: "98450".to_string(),
            pickup_location: "Gate 2".to_string(),
        }
    }

    #[tokio::test]
    async fn blocked_purchase_leaves_profile_untouched() {
        let h = harness(FakeAlgod::new().with_balance(0), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        h.store.save_profile(BUYER, stored_profile()).await.unwrap();
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientFunds(Some(_))));

        let profile = h.store.get_profile(BUYER).await.unwrap().unwrap();
        assert_eq!(profile.phone, "98450");
        assert_eq!(profile.pickup_location, "Gate 2");
    }

    #[tokio::test]
    async fn blank_buyer_fields_keep_stored_values() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000).confirm_after_polls(1), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        h.store.save_profile(BUYER, stored_profile()).await.unwrap();
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        h.checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap();

        let profile = h.store.get_profile(BUYER).await.unwrap().unwrap();
        assert_eq!(profile.phone, "98450");
        assert_eq!(profile.pickup_location, "Gate 2");
        let orders = h.store.list_orders_by_buyer(BUYER).await.unwrap();
        assert_eq!(orders[0].buyer_phone, "98450");
    }

    #[tokio::test]
    async fn node_overspend_is_insufficient_funds() {
        let h = harness(
            FakeAlgod::new()
                .with_balance(5_000_000)
                .with_pool_error("overspend (account X)"),
            None,
        );
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientFunds(None)));
        assert_eq!(
            err.to_string(),
            "Purchase failed. Make sure you have enough ALGO and try again."
        );

        let item = h.store.get_item("item-1").await.unwrap().unwrap();
        assert!(item.is_available());
        assert!(h.store.list_orders_by_buyer(BUYER).await.unwrap().is_empty());
        assert!(h.db.list_settlements().unwrap().is_empty());
    }

    #[tokio::test]
    async fn timed_out_payment_drops_balance_snapshot() {
        let h = harness(FakeAlgod::new().with_balance(5_000_000), None);
        h.store.inner().insert_item(listing(1.0, Some(SELLER))).await;
        h.checkout
            .quote(&WalletAddress::from(BUYER), "item-1")
            .await
            .unwrap();
        assert!(h.checkout.quotes.get(BUYER).is_some());
        let wallet = FakeWallet::with_accounts(&[BUYER]);

        let err = h
            .checkout
            .purchase(&session(), &wallet, "item-1", buyer())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ConfirmationTimeout { .. }));
        assert!(h.checkout.quotes.get(BUYER).is_none());
    }
}
