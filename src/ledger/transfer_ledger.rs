// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The append-only transfer ledger.

use std::sync::Arc;

use alloy::primitives::U256;

use super::cache::{Timeline, TimelineCache};
use super::database::WireDatabase;
use super::record::{WireDraft, WireRecord};
use crate::access::AccessRegistry;
use crate::error::WireError;
use crate::models::Account;

/// Default number of receiver timelines kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Append-only store of wire records with time-windowed aggregation.
///
/// Only authorized writers (see [`AccessRegistry::is_authorized_writer`])
/// may append. Reads are open to everyone.
pub struct TransferLedger {
    db: Arc<WireDatabase>,
    access: Arc<AccessRegistry>,
    cache: TimelineCache,
}

impl TransferLedger {
    pub fn new(db: Arc<WireDatabase>, access: Arc<AccessRegistry>, cache_capacity: usize) -> Self {
        Self {
            db,
            access,
            cache: TimelineCache::new(cache_capacity),
        }
    }

    /// Append a record on behalf of `writer`.
    pub fn record(
        &self,
        writer: &Account,
        sender: &Account,
        receiver: &Account,
        amount: U256,
        timestamp: u64,
    ) -> Result<WireRecord, WireError> {
        let draft = WireDraft {
            sender: *sender,
            receiver: *receiver,
            amount,
            timestamp,
        };
        self.record_settled(writer, draft, || Ok(()))
    }

    /// Append a record only if `settle` succeeds.
    ///
    /// The record is staged first, then `settle` runs while the write slot
    /// is held, then the record is committed. If `settle` fails the staged
    /// record is discarded and its error returned unchanged. If the commit
    /// fails after `settle` succeeded, the error is [`WireError::Unrecorded`]:
    /// the settlement stands and has no ledger entry.
    pub fn record_settled<F>(
        &self,
        writer: &Account,
        draft: WireDraft,
        settle: F,
    ) -> Result<WireRecord, WireError>
    where
        F: FnOnce() -> Result<(), WireError>,
    {
        if !self.access.is_authorized_writer(writer)? {
            tracing::warn!(writer = %writer, "Rejected ledger append from unauthorized writer");
            return Err(WireError::unauthorized(writer, "append to the wire ledger"));
        }
        if draft.amount.is_zero() {
            return Err(WireError::InvalidAmount);
        }

        let staged = self.db.stage_wire(draft)?;

        if let Err(err) = settle() {
            tracing::debug!(
                seq = staged.record().seq,
                error = %err,
                "Settlement failed, discarding staged wire"
            );
            if let Err(abort_err) = staged.abort() {
                tracing::warn!(error = %abort_err, "Failed to abort staged wire");
            }
            return Err(err);
        }

        let record = match staged.commit() {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    writer = %writer,
                    sender = %draft.sender,
                    receiver = %draft.receiver,
                    amount = %draft.amount,
                    error = %e,
                    "Ledger commit failed after settlement"
                );
                return Err(WireError::Unrecorded(e));
            }
        };
        self.cache.invalidate(&record.receiver);

        tracing::debug!(seq = record.seq, receiver = %record.receiver, "Wire appended");
        Ok(record)
    }

    /// Sum of amounts received by `receiver` at or after `since`.
    pub fn sum_since(&self, receiver: &Account, since: u64) -> Result<U256, WireError> {
        Ok(self.timeline(receiver)?.sum_since(since))
    }

    /// Wires received by `receiver` at or after `since`, oldest first.
    pub fn wires_to(&self, receiver: &Account, since: u64) -> Result<Vec<WireRecord>, WireError> {
        Ok(self.db.wires_to(receiver, since)?)
    }

    /// Look up a record by position.
    pub fn get(&self, seq: u64) -> Result<Option<WireRecord>, WireError> {
        Ok(self.db.get_wire(seq)?)
    }

    /// Number of records in the ledger.
    pub fn len(&self) -> Result<u64, WireError> {
        Ok(self.db.wire_count()?)
    }

    pub fn is_empty(&self) -> Result<bool, WireError> {
        Ok(self.len()? == 0)
    }

    fn timeline(&self, receiver: &Account) -> Result<Arc<Timeline>, WireError> {
        if let Some(timeline) = self.cache.get(receiver) {
            return Ok(timeline);
        }
        let observed = self.cache.generation();
        let timeline = Arc::new(Timeline::from_sorted(self.db.receiver_timeline(receiver)?));
        self.cache
            .put_if_current(*receiver, Arc::clone(&timeline), observed);
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::database::WireDatabase;

    struct Fixture {
        ledger: TransferLedger,
        access: Arc<AccessRegistry>,
        db: Arc<WireDatabase>,
        owner: Account,
        writer: Account,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(WireDatabase::open(&dir.path().join("ledger.redb")).unwrap());
        let owner = Account::repeat_byte(0xaa);
        let writer = Account::repeat_byte(0xee);
        let access = Arc::new(AccessRegistry::open(Arc::clone(&db), owner).unwrap());
        access
            .set_writer_authorization(&owner, &writer, true)
            .unwrap();
        let ledger = TransferLedger::new(Arc::clone(&db), Arc::clone(&access), 16);
        Fixture {
            ledger,
            access,
            db,
            owner,
            writer,
            _dir: dir,
        }
    }

    fn sender() -> Account {
        Account::repeat_byte(0x11)
    }

    fn receiver() -> Account {
        Account::repeat_byte(0x22)
    }

    #[test]
    fn authorized_writer_appends() {
        let f = fixture();
        let record = f
            .ledger
            .record(&f.writer, &sender(), &receiver(), U256::from(10u64), 1000)
            .unwrap();

        assert_eq!(record.seq, 0);
        assert_eq!(f.ledger.len().unwrap(), 1);
        assert_eq!(f.ledger.get(0).unwrap(), Some(record));
    }

    #[test]
    fn unauthorized_writer_is_rejected() {
        let f = fixture();
        let stranger = Account::repeat_byte(0x99);

        let err = f
            .ledger
            .record(&stranger, &sender(), &receiver(), U256::from(10u64), 1000)
            .unwrap_err();
        assert!(matches!(err, WireError::Unauthorized { caller, .. } if caller == stranger));
        assert!(f.ledger.is_empty().unwrap());

        // Revoking a writer takes effect immediately.
        f.access
            .set_writer_authorization(&f.owner, &f.writer, false)
            .unwrap();
        assert!(f
            .ledger
            .record(&f.writer, &sender(), &receiver(), U256::from(10u64), 1000)
            .is_err());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let f = fixture();
        let err = f
            .ledger
            .record(&f.writer, &sender(), &receiver(), U256::ZERO, 1000)
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidAmount));
    }

    #[test]
    fn failed_settlement_discards_record() {
        let f = fixture();
        let draft = WireDraft {
            sender: sender(),
            receiver: receiver(),
            amount: U256::from(10u64),
            timestamp: 1000,
        };

        let err = f
            .ledger
            .record_settled(&f.writer, draft, || {
                Err(WireError::InsufficientBalance {
                    required: U256::from(10u64),
                    available: U256::ZERO,
                })
            })
            .unwrap_err();

        assert!(matches!(err, WireError::InsufficientBalance { .. }));
        assert!(f.ledger.is_empty().unwrap());
        assert_eq!(f.ledger.sum_since(&receiver(), 0).unwrap(), U256::ZERO);
    }

    #[test]
    fn settle_does_not_run_for_unauthorized_writer() {
        let f = fixture();
        let draft = WireDraft {
            sender: sender(),
            receiver: receiver(),
            amount: U256::from(10u64),
            timestamp: 1000,
        };
        let mut settled = false;

        let result = f.ledger.record_settled(&Account::repeat_byte(0x99), draft, || {
            settled = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(!settled);
    }

    #[test]
    fn sums_exclude_a_wire_until_it_commits() {
        let f = fixture();
        f.ledger
            .record(&f.writer, &sender(), &receiver(), U256::from(5u64), 900)
            .unwrap();
        let draft = WireDraft {
            sender: sender(),
            receiver: receiver(),
            amount: U256::from(10u64),
            timestamp: 1000,
        };
        let mut during = None;

        f.ledger
            .record_settled(&f.writer, draft, || {
                during = Some((
                    f.ledger.sum_since(&receiver(), 0)?,
                    f.ledger.len()?,
                ));
                Ok(())
            })
            .unwrap();

        assert_eq!(during, Some((U256::from(5u64), 1)));
        assert_eq!(f.ledger.sum_since(&receiver(), 0).unwrap(), U256::from(15u64));
        assert_eq!(f.ledger.len().unwrap(), 2);
    }

    #[test]
    fn cached_sums_follow_appends() {
        let f = fixture();
        let r = receiver();

        assert_eq!(f.ledger.sum_since(&r, 0).unwrap(), U256::ZERO);

        f.ledger
            .record(&f.writer, &sender(), &r, U256::from(10u64), 100)
            .unwrap();
        assert_eq!(f.ledger.sum_since(&r, 0).unwrap(), U256::from(10u64));

        f.ledger
            .record(&f.writer, &sender(), &r, U256::from(15u64), 200)
            .unwrap();
        assert_eq!(f.ledger.sum_since(&r, 0).unwrap(), U256::from(25u64));
        assert_eq!(f.ledger.sum_since(&r, 150).unwrap(), U256::from(15u64));
        assert_eq!(f.ledger.sum_since(&r, 201).unwrap(), U256::ZERO);

        // The cached answer matches a direct index scan.
        assert_eq!(
            f.ledger.sum_since(&r, 150).unwrap(),
            f.db.sum_since(&r, 150).unwrap()
        );
    }

    #[test]
    fn self_transfers_are_recorded() {
        let f = fixture();
        let account = sender();
        f.ledger
            .record(&f.writer, &account, &account, U256::from(3u64), 100)
            .unwrap();

        let wires = f.ledger.wires_to(&account, 0).unwrap();
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].sender, wires[0].receiver);
    }
}
