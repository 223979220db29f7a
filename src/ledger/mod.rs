// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wire Ledger Storage
//!
//! Append-only history of committed wires, persisted in redb, plus the
//! whitelist and writer tables used by the access registry.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   wire-ledger.redb
//!     wires            seq → WireRecord (JSON)
//!     receiver_index   receiver|timestamp|seq → amount
//!     whitelist        address → 1
//!     writers          address → 1
//!     registry_state   "owner" → address
//! ```
//!
//! Records are never updated or deleted. Aggregation queries
//! (`sum_since`) are range scans over `receiver_index`, fronted by an
//! in-process LRU cache.

pub mod cache;
pub mod database;
pub mod record;
pub mod transfer_ledger;

pub use database::{LedgerDbError, LedgerDbResult, Membership, StagedWire, WireDatabase};
pub use record::{WireDraft, WireRecord};
pub use transfer_ledger::{TransferLedger, DEFAULT_CACHE_CAPACITY};

/// File name of the ledger database inside `DATA_DIR`.
pub const LEDGER_DB_FILE: &str = "wire-ledger.redb";
