// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control
//!
//! Capability checks for the wire service.
//!
//! ## Model
//!
//! 1. A single **owner** administers the registry.
//! 2. The owner maintains a **whitelist** of delegates. A whitelisted
//!    delegate may trigger a wire from any sender that has approved the
//!    engine; the delegate needs no allowance of its own.
//! 3. The owner maintains a set of **writers** allowed to append to the
//!    transfer ledger. Keeping this separate from any one engine lets a new
//!    engine take over an existing ledger.
//!
//! Checks are explicit calls at the top of each operation, never implicit.
//! The account they check is the one proven by [`crate::auth::Caller`].

pub mod registry;

pub use registry::AccessRegistry;
