// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! This module defines the [`Account`] address type shared by every layer,
//! and the request and response structures used by the REST API. API types
//! derive `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation.
//!
//! Addresses and amounts travel over the API as strings: addresses as
//! `0x`-prefixed hex, amounts as decimal (or `0x` hex) integers, since
//! token amounts routinely exceed what JSON numbers can carry.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::ledger::WireRecord;

// =============================================================================
// Account Type
// =============================================================================

/// A 20-byte account address.
///
/// Rendered as lowercase `0x`-prefixed hex. Parsing accepts either case and
/// does not enforce EIP-55 checksums.
///
/// # Example
///
/// ```rust
/// use wire_ledger::models::Account;
///
/// let account: Account = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".parse().unwrap();
/// assert_eq!(account.to_string(), "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(Address);

impl Account {
    /// Build an account from raw address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(Address::from(bytes))
    }

    /// An account whose 20 bytes are all `byte`. Handy for fixtures.
    pub fn repeat_byte(byte: u8) -> Self {
        Self(Address::repeat_byte(byte))
    }

    /// Raw address bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&alloy::hex::encode_prefixed(self.0.as_slice()))
    }
}

/// Error returned when a string is not a valid 20-byte hex address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid account address `{input}`: {reason}")]
pub struct AccountParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for Account {
    type Err = AccountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Address::from_str(trimmed)
            .map(Account)
            .map_err(|e| AccountParseError {
                input: trimmed.to_string(),
                reason: e.to_string(),
            })
    }
}

impl TryFrom<String> for Account {
    type Error = AccountParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Account> for String {
    fn from(value: Account) -> Self {
        value.to_string()
    }
}

/// Parse a token amount given as a decimal or `0x`-prefixed hex string.
pub fn parse_amount(raw: &str) -> Result<U256, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("amount must not be empty".to_string());
    }
    U256::from_str(trimmed).map_err(|e| format!("invalid amount `{trimmed}`: {e}"))
}

// =============================================================================
// Wire Models
// =============================================================================

/// Request to wire tokens from the caller to a receiver.
///
/// The caller must have approved at least `amount` to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WireRequest {
    /// Receiving account (0x hex).
    pub receiver: String,
    /// Amount in token base units.
    pub amount: String,
}

/// Request from a whitelisted delegate to wire tokens on behalf of a sender.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DelegatedWireRequest {
    /// Paying account; must have approved the engine.
    pub sender: String,
    /// Receiving account.
    pub receiver: String,
    /// Amount in token base units.
    pub amount: String,
}

/// A committed wire as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WireReceipt {
    /// Position of the record in the ledger (zero-based).
    pub seq: u64,
    pub sender: String,
    pub receiver: String,
    /// Amount in token base units (decimal).
    pub amount: String,
    /// Unix timestamp (seconds) at which the wire was committed.
    pub timestamp: u64,
}

impl From<&WireRecord> for WireReceipt {
    fn from(record: &WireRecord) -> Self {
        Self {
            seq: record.seq,
            sender: record.sender.to_string(),
            receiver: record.receiver.to_string(),
            amount: record.amount.to_string(),
            timestamp: record.timestamp,
        }
    }
}

/// Time window filter for wire history.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Only include wires at or after this Unix timestamp.
    pub since: Option<u64>,
}

/// Threshold query: has at least `amount` reached the receiver since `since`?
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct HasSentQuery {
    /// Threshold in token base units.
    pub amount: String,
    /// Start of the window (Unix timestamp, inclusive).
    pub since: u64,
}

/// Result of a threshold query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct HasSentResponse {
    pub receiver: String,
    /// Threshold that was checked.
    pub amount: String,
    pub since: u64,
    /// Total wired to the receiver within the window.
    pub total: String,
    /// Whether `total >= amount`.
    pub has_sent: bool,
}

// =============================================================================
// Access Models
// =============================================================================

/// Membership status of an address in the delegate whitelist or writer set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MembershipStatus {
    pub address: String,
    pub allowed: bool,
}

/// Current registry owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OwnerResponse {
    pub owner: String,
}

/// Request to hand registry ownership to another account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferOwnershipRequest {
    pub new_owner: String,
}

// =============================================================================
// Token Models
// =============================================================================

/// Token balance of an account, and the allowance it has granted the engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TokenBalanceResponse {
    pub address: String,
    pub balance: String,
    /// Allowance granted by `address` to the wire engine.
    pub engine_allowance: String,
}

/// Request to approve a spender (defaults to the wire engine).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApproveRequest {
    #[serde(default)]
    pub spender: Option<String>,
    pub amount: String,
}

/// Approve the engine and wire in one call.
///
/// Supply either `receiver` (the payload is encoded for you) or a raw
/// hex `payload`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApproveAndCallRequest {
    pub amount: String,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

/// Request to mint sandbox tokens (owner only).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MintRequest {
    pub account: String,
    pub amount: String,
}
