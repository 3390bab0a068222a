// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Settlement of confirmed payments: marking the item sold and writing the
//! order. A settlement that fails is kept in the local outbox until an
//! operator retries it; nothing retries automatically.

use chrono::Utc;
use tracing::{error, info, warn};

use super::{Checkout, CheckoutError};
use crate::models::{ItemStatus, NewOrder, Order, PendingSettlement, SettlementStep};
use crate::storage::LocalDbError;
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("No pending settlement for transaction {0}")]
    NotFound(String),

    #[error("Settlement of {tx_id} failed again: {source}")]
    Store {
        tx_id: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    LocalDb(#[from] LocalDbError),
}

/// Run the settlement writes starting at `from`.
async fn apply(
    store: &dyn DocumentStore,
    from: SettlementStep,
    item_id: &str,
    order: &NewOrder,
) -> Result<Order, (SettlementStep, StoreError)> {
    if from == SettlementStep::MarkItemSold {
        store
            .update_item_status(item_id, ItemStatus::Sold)
            .await
            .map_err(|e| (SettlementStep::MarkItemSold, e))?;
    }
    store
        .add_order(order.clone())
        .await
        .map_err(|e| (SettlementStep::RecordOrder, e))
}

impl Checkout {
    /// Write the item and order for a confirmed payment, queueing the
    /// settlement in the outbox if either write fails.
    pub(super) async fn settle(&self, draft: NewOrder) -> Result<Order, CheckoutError> {
        let item_id = draft.item_id.clone();
        match apply(
            self.store.as_ref(),
            SettlementStep::MarkItemSold,
            &item_id,
            &draft,
        )
        .await
        {
            Ok(order) => Ok(order),
            Err((step, e)) => {
                error!(
                    tx_id = %draft.tx_id,
                    item_id = %item_id,
                    step = ?step,
                    error = %e,
                    "Payment confirmed but purchase was not recorded"
                );
                let tx_id = draft.tx_id.clone();
                let pending = PendingSettlement {
                    tx_id: tx_id.clone(),
                    item_id,
                    order: draft,
                    failed_step: step,
                    error: e.to_string(),
                    recorded_at: Utc::now(),
                    attempts: 0,
                };
                if let Err(db_err) = self.db.put_settlement(&pending) {
                    error!(
                        tx_id = %tx_id,
                        error = %db_err,
                        "Failed to write settlement outbox"
                    );
                }
                Err(CheckoutError::PaymentNotRecorded {
                    tx_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub fn pending_settlements(&self) -> Result<Vec<PendingSettlement>, SettlementError> {
        Ok(self.db.list_settlements()?)
    }

    /// Replay a queued settlement from the step that failed. The record is
    /// removed on success and updated with the new error otherwise.
    pub async fn retry_settlement(&self, tx_id: &str) -> Result<Order, SettlementError> {
        let mut pending = self
            .db
            .get_settlement(tx_id)?
            .ok_or_else(|| SettlementError::NotFound(tx_id.to_string()))?;

        match apply(
            self.store.as_ref(),
            pending.failed_step,
            &pending.item_id,
            &pending.order,
        )
        .await
        {
            Ok(order) => {
                self.db.remove_settlement(tx_id)?;
                info!(tx_id = %tx_id, order_id = %order.id, "Settlement completed on retry");
                Ok(order)
            }
            Err((step, e)) => {
                pending.failed_step = step;
                pending.error = e.to_string();
                pending.attempts += 1;
                self.db.put_settlement(&pending)?;
                warn!(
                    tx_id = %tx_id,
                    attempts = pending.attempts,
                    error = %e,
                    "Settlement retry failed"
                );
                Err(SettlementError::Store {
                    tx_id: tx_id.to_string(),
                    source: e,
                })
            }
        }
    }
}
