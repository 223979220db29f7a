// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire records.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::models::Account;

/// One committed transfer. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Zero-based append position.
    pub seq: u64,
    pub sender: Account,
    pub receiver: Account,
    #[serde(with = "u256_decimal")]
    pub amount: U256,
    /// Unix timestamp in seconds, as supplied by the writer's clock.
    pub timestamp: u64,
}

/// A record before it has been assigned a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireDraft {
    pub sender: Account,
    pub receiver: Account,
    pub amount: U256,
    pub timestamp: u64,
}

impl WireDraft {
    pub(crate) fn into_record(self, seq: u64) -> WireRecord {
        WireRecord {
            seq,
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
            timestamp: self.timestamp,
        }
    }
}

/// Serialize `U256` as a decimal string so stored JSON stays readable.
mod u256_decimal {
    use std::str::FromStr;

    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_str(&raw).map_err(D::Error::custom)
    }
}
