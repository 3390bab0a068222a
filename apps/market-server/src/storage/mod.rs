// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage
//!
//! State the server keeps on its own disk and in process memory, as
//! opposed to the remote document store.
//!
//! ```text
//! $DATA_DIR/
//!   market.redb     # listing cache + settlement outbox
//! ```
//!
//! Balance quotes live only in memory ([`QuoteCache`]).

pub mod local_db;
pub mod quote_cache;

pub use local_db::{CachedListing, LocalDb, LocalDbError, LocalDbResult};
pub use quote_cache::QuoteCache;
