// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire Ledger - Token Wire Service
//!
//! Moves fungible token balances from a sender to a receiver under three
//! authorization paths, and keeps an append-only history of every committed
//! wire that can be queried over time windows.
//!
//! ## Modules
//!
//! - `auth` - Bearer token authentication of the calling account
//! - `access` - Owner-administered delegate whitelist and ledger writers
//! - `ledger` - Append-only wire history (redb) with windowed sums
//! - `calldata` - Approve-and-call payload decoding
//! - `token` - Token collaborator trait and in-process sandbox token
//! - `engine` - The wire engine tying the above together
//! - `api` - HTTP API handlers (Axum)

pub mod access;
pub mod api;
pub mod auth;
pub mod calldata;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod state;
pub mod token;
