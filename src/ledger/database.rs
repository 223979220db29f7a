// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wire database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wires`: seq → serialized WireRecord
//! - `receiver_index`: composite key (receiver|timestamp|seq) → amount
//! - `whitelist`: lowercase address → 1
//! - `writers`: lowercase address → 1
//! - `registry_state`: key → value (e.g. "owner" → lowercase address)
//!
//! Appends go through [`StagedWire`]: the record is written inside an open
//! write transaction that the caller commits or aborts. redb admits one
//! write transaction at a time, so a staged wire also holds the global
//! write slot until it is resolved.

use std::path::Path;

use alloy::primitives::U256;
use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};

use super::record::{WireDraft, WireRecord};
use crate::models::Account;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: seq → serialized WireRecord (JSON bytes).
const WIRES: TableDefinition<u64, &[u8]> = TableDefinition::new("wires");

/// Index: composite key → amount (32-byte big-endian).
/// Key format: `receiver(20) | timestamp_be(8) | seq_be(8)` for ascending-time range scans.
const RECEIVER_INDEX: TableDefinition<&[u8], &[u8]> = TableDefinition::new("receiver_index");

/// Delegates allowed to call `wire_from_delegate`.
const WHITELIST: TableDefinition<&str, u8> = TableDefinition::new("whitelist");

/// Engine identities allowed to append wires.
const WRITERS: TableDefinition<&str, u8> = TableDefinition::new("writers");

/// Registry state: key → value.
const REGISTRY_STATE: TableDefinition<&str, &str> = TableDefinition::new("registry_state");

const OWNER_KEY: &str = "owner";

const INDEX_KEY_LEN: usize = 20 + 8 + 8;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt entry: {0}")]
    Corrupt(String),
}

pub type LedgerDbResult<T> = Result<T, LedgerDbError>;

/// Which membership table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Whitelist,
    Writers,
}

impl Membership {
    fn table(self) -> TableDefinition<'static, &'static str, u8> {
        match self {
            Membership::Whitelist => WHITELIST,
            Membership::Writers => WRITERS,
        }
    }
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the receiver_index table.
///
/// Big-endian timestamp and seq keep entries of one receiver in time order,
/// with append order breaking ties.
fn make_index_key(receiver: &Account, timestamp: u64, seq: u64) -> [u8; INDEX_KEY_LEN] {
    let mut key = [0u8; INDEX_KEY_LEN];
    key[..20].copy_from_slice(receiver.as_slice());
    key[20..28].copy_from_slice(&timestamp.to_be_bytes());
    key[28..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Split a composite key back into `(timestamp, seq)`.
fn split_index_key(key: &[u8]) -> LedgerDbResult<(u64, u64)> {
    if key.len() != INDEX_KEY_LEN {
        return Err(LedgerDbError::Corrupt(format!(
            "index key has {} bytes, expected {INDEX_KEY_LEN}",
            key.len()
        )));
    }
    let mut ts = [0u8; 8];
    let mut seq = [0u8; 8];
    ts.copy_from_slice(&key[20..28]);
    seq.copy_from_slice(&key[28..]);
    Ok((u64::from_be_bytes(ts), u64::from_be_bytes(seq)))
}

fn decode_amount(bytes: &[u8]) -> LedgerDbResult<U256> {
    if bytes.len() != 32 {
        return Err(LedgerDbError::Corrupt(format!(
            "amount has {} bytes, expected 32",
            bytes.len()
        )));
    }
    Ok(U256::from_be_slice(bytes))
}

fn decode_account(raw: &str) -> LedgerDbResult<Account> {
    raw.parse()
        .map_err(|e: crate::models::AccountParseError| LedgerDbError::Corrupt(e.to_string()))
}

// =============================================================================
// StagedWire
// =============================================================================

/// A wire written inside an uncommitted transaction.
pub struct StagedWire {
    txn: WriteTransaction,
    record: WireRecord,
}

impl StagedWire {
    /// The record that will be visible once committed.
    pub fn record(&self) -> &WireRecord {
        &self.record
    }

    /// Make the record durable and visible to readers.
    pub fn commit(self) -> LedgerDbResult<WireRecord> {
        self.txn.commit()?;
        Ok(self.record)
    }

    /// Discard the record.
    pub fn abort(self) -> LedgerDbResult<()> {
        self.txn.abort()?;
        Ok(())
    }
}

// =============================================================================
// WireDatabase
// =============================================================================

/// Embedded ACID wire database.
pub struct WireDatabase {
    db: Database,
}

impl WireDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WIRES)?;
            let _ = write_txn.open_table(RECEIVER_INDEX)?;
            let _ = write_txn.open_table(WHITELIST)?;
            let _ = write_txn.open_table(WRITERS)?;
            let _ = write_txn.open_table(REGISTRY_STATE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Wires
    // =========================================================================

    /// Write a wire and its index entry without committing.
    ///
    /// Blocks until no other write transaction is open.
    pub fn stage_wire(&self, draft: WireDraft) -> LedgerDbResult<StagedWire> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut wires = write_txn.open_table(WIRES)?;
            let seq = wires.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);
            let record = draft.into_record(seq);
            let json = serde_json::to_vec(&record)?;
            wires.insert(seq, json.as_slice())?;

            let mut idx = write_txn.open_table(RECEIVER_INDEX)?;
            let key = make_index_key(&record.receiver, record.timestamp, seq);
            let amount = record.amount.to_be_bytes::<32>();
            idx.insert(key.as_slice(), amount.as_slice())?;
            record
        };
        Ok(StagedWire {
            txn: write_txn,
            record,
        })
    }

    /// Look up a single wire by position.
    pub fn get_wire(&self, seq: u64) -> LedgerDbResult<Option<WireRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WIRES)?;
        match table.get(seq)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Number of wires ever appended.
    pub fn wire_count(&self) -> LedgerDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WIRES)?;
        let count = table.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);
        Ok(count)
    }

    /// All `(timestamp, amount)` pairs received by `receiver`, oldest first.
    pub fn receiver_timeline(&self, receiver: &Account) -> LedgerDbResult<Vec<(u64, U256)>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(RECEIVER_INDEX)?;

        let start = make_index_key(receiver, 0, 0);
        let end = make_index_key(receiver, u64::MAX, u64::MAX);

        let mut timeline = Vec::new();
        for entry in idx.range(start.as_slice()..=end.as_slice())? {
            let (key, value) = entry?;
            let (timestamp, _) = split_index_key(key.value())?;
            timeline.push((timestamp, decode_amount(value.value())?));
        }
        Ok(timeline)
    }

    /// Sum of amounts received by `receiver` at or after `since`.
    ///
    /// Saturates at `U256::MAX`.
    pub fn sum_since(&self, receiver: &Account, since: u64) -> LedgerDbResult<U256> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(RECEIVER_INDEX)?;

        let start = make_index_key(receiver, since, 0);
        let end = make_index_key(receiver, u64::MAX, u64::MAX);

        let mut total = U256::ZERO;
        for entry in idx.range(start.as_slice()..=end.as_slice())? {
            let (_, value) = entry?;
            total = total.saturating_add(decode_amount(value.value())?);
        }
        Ok(total)
    }

    /// Wires received by `receiver` at or after `since`, oldest first.
    pub fn wires_to(&self, receiver: &Account, since: u64) -> LedgerDbResult<Vec<WireRecord>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(RECEIVER_INDEX)?;
        let wires = read_txn.open_table(WIRES)?;

        let start = make_index_key(receiver, since, 0);
        let end = make_index_key(receiver, u64::MAX, u64::MAX);

        let mut records = Vec::new();
        for entry in idx.range(start.as_slice()..=end.as_slice())? {
            let (key, _) = entry?;
            let (_, seq) = split_index_key(key.value())?;
            let value = wires.get(seq)?.ok_or_else(|| {
                LedgerDbError::Corrupt(format!("index points at missing wire {seq}"))
            })?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    // =========================================================================
    // Membership (whitelist / writers)
    // =========================================================================

    /// Check whether an address is a member of the given set.
    pub fn is_member(&self, set: Membership, account: &Account) -> LedgerDbResult<bool> {
        let key = account.to_string();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(set.table())?;
        Ok(table.get(key.as_str())?.is_some())
    }

    /// Add or remove addresses in one transaction.
    ///
    /// Returns how many entries actually changed.
    pub fn set_members(
        &self,
        set: Membership,
        accounts: &[Account],
        allowed: bool,
    ) -> LedgerDbResult<usize> {
        let mut changed = 0;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(set.table())?;
            for account in accounts {
                let key = account.to_string();
                let previous = if allowed {
                    table.insert(key.as_str(), 1u8)?.is_some()
                } else {
                    table.remove(key.as_str())?.is_some()
                };
                if previous != allowed {
                    changed += 1;
                }
            }
        }
        write_txn.commit()?;
        Ok(changed)
    }

    /// List every member of the given set, sorted by address.
    pub fn list_members(&self, set: Membership) -> LedgerDbResult<Vec<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(set.table())?;
        let mut members = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            members.push(decode_account(key.value())?);
        }
        Ok(members)
    }

    // =========================================================================
    // Registry owner
    // =========================================================================

    /// The persisted registry owner, if one has been recorded.
    pub fn get_owner(&self) -> LedgerDbResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REGISTRY_STATE)?;
        match table.get(OWNER_KEY)? {
            Some(v) => Ok(Some(decode_account(v.value())?)),
            None => Ok(None),
        }
    }

    /// Persist the registry owner.
    pub fn set_owner(&self, owner: &Account) -> LedgerDbResult<()> {
        let value = owner.to_string();
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REGISTRY_STATE)?;
            table.insert(OWNER_KEY, value.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
