// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wire Engine
//!
//! Orchestrates the three ways tokens are wired to a receiver:
//!
//! | Path | Who calls | Paying account | Check |
//! |------|-----------|----------------|-------|
//! | Direct | sender | caller | allowance to the engine |
//! | Delegated | whitelisted delegate | named sender | delegate whitelist |
//! | Approve-and-call | token | approving account | caller is the configured token |
//!
//! Each path ends in the same settlement step: the ledger record is staged,
//! the token moves the funds, and the record is committed. Either both the
//! transfer and the record happen, or neither does, with one exception: a
//! commit failing after the transfer leaves the funds moved and unrecorded,
//! reported as [`WireError::Unrecorded`]. The in-process token has no undo.

use std::sync::{Arc, Mutex, PoisonError};

use alloy::primitives::U256;

use crate::access::AccessRegistry;
use crate::calldata;
use crate::clock::Clock;
use crate::error::WireError;
use crate::ledger::{TransferLedger, WireDraft, WireRecord};
use crate::models::Account;
use crate::token::{ApprovalHandler, Token};

#[derive(Debug, Clone, Copy)]
enum WirePath {
    Direct,
    Delegated,
    ApproveAndCall,
}

impl WirePath {
    fn as_str(self) -> &'static str {
        match self {
            WirePath::Direct => "direct",
            WirePath::Delegated => "delegated",
            WirePath::ApproveAndCall => "approve_and_call",
        }
    }
}

pub struct WireEngine<T: Token, C: Clock> {
    address: Account,
    token: Arc<T>,
    access: Arc<AccessRegistry>,
    ledger: Arc<TransferLedger>,
    clock: Arc<C>,
    /// Serializes settlement.
    write_lock: Mutex<()>,
}

impl<T: Token, C: Clock> WireEngine<T, C> {
    /// Create an engine identified by `address`.
    ///
    /// `address` is the spender senders approve on the token, and must be an
    /// authorized ledger writer for wires to succeed.
    pub fn new(
        address: Account,
        token: Arc<T>,
        access: Arc<AccessRegistry>,
        ledger: Arc<TransferLedger>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            address,
            token,
            access,
            ledger,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn address(&self) -> Account {
        self.address
    }

    /// Wire `amount` from `caller` to `receiver`.
    ///
    /// Spends the allowance `caller` granted to the engine.
    pub fn wire(
        &self,
        caller: &Account,
        receiver: &Account,
        amount: U256,
    ) -> Result<WireRecord, WireError> {
        self.settle(WirePath::Direct, caller, receiver, amount)
    }

    /// Wire `amount` from `sender` to `receiver` on behalf of a whitelisted
    /// delegate.
    pub fn wire_from_delegate(
        &self,
        delegate: &Account,
        sender: &Account,
        receiver: &Account,
        amount: U256,
    ) -> Result<WireRecord, WireError> {
        if !self.access.is_whitelisted(delegate)? {
            tracing::warn!(delegate = %delegate, sender = %sender, "Rejected wire from non-whitelisted delegate");
            return Err(WireError::unauthorized(delegate, "wire on behalf of another sender"));
        }
        self.settle(WirePath::Delegated, sender, receiver, amount)
    }

    /// Whether at least `amount` has been wired to `receiver` since `since`,
    /// summed over all wires in the window.
    pub fn has_sent(&self, receiver: &Account, amount: U256, since: u64) -> Result<bool, WireError> {
        Ok(self.ledger.sum_since(receiver, since)? >= amount)
    }

    /// Total wired to `receiver` since `since`.
    pub fn sent_since(&self, receiver: &Account, since: u64) -> Result<U256, WireError> {
        self.ledger.sum_since(receiver, since)
    }

    pub fn add_address_to_whitelist(
        &self,
        caller: &Account,
        address: &Account,
    ) -> Result<(), WireError> {
        self.access.add_to_whitelist(caller, address)
    }

    pub fn remove_address_from_whitelist(
        &self,
        caller: &Account,
        address: &Account,
    ) -> Result<(), WireError> {
        self.access.remove_from_whitelist(caller, address)
    }

    fn settle(
        &self,
        path: WirePath,
        sender: &Account,
        receiver: &Account,
        amount: U256,
    ) -> Result<WireRecord, WireError> {
        if amount.is_zero() {
            return Err(WireError::InvalidAmount);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let draft = WireDraft {
            sender: *sender,
            receiver: *receiver,
            amount,
            timestamp: self.clock.now(),
        };

        let record = self.ledger.record_settled(&self.address, draft, || {
            self.token
                .transfer_from(&self.address, sender, receiver, amount)
                .map_err(WireError::from)
        })?;

        tracing::info!(
            event = "wire.sent",
            path = path.as_str(),
            seq = record.seq,
            sender = %record.sender,
            receiver = %record.receiver,
            amount = %record.amount,
            timestamp = record.timestamp,
            "Wire sent"
        );
        Ok(record)
    }
}

impl<T: Token, C: Clock> ApprovalHandler for WireEngine<T, C> {
    type Receipt = WireRecord;

    fn spender(&self) -> Account {
        self.address
    }

    fn receive_approval(
        &self,
        token: &Account,
        from: &Account,
        amount: U256,
        payload: &[u8],
    ) -> Result<WireRecord, WireError> {
        if *token != self.token.address() {
            tracing::warn!(caller = %token, "Rejected approval notification from unknown token");
            return Err(WireError::unauthorized(token, "notify the wire engine of an approval"));
        }
        let receiver = calldata::decode_receiver(payload)?;
        self.settle(WirePath::ApproveAndCall, from, &receiver, amount)
    }
}
