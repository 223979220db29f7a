// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process token ledger.
//!
//! Behaves like a plain ERC-20: allowances are replaced by `approve`,
//! consumed by `transfer_from`, and every call either fully applies or
//! leaves the book untouched.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy::primitives::U256;

use super::{ApprovalHandler, Token, TokenError};
use crate::error::WireError;
use crate::models::Account;

#[derive(Default)]
struct Book {
    balances: HashMap<Account, U256>,
    allowances: HashMap<(Account, Account), U256>,
    total_supply: U256,
}

impl Book {
    fn balance(&self, account: &Account) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Account, spender: &Account) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    fn set_allowance(&mut self, owner: &Account, spender: &Account, amount: U256) {
        if amount.is_zero() {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
    }
}

/// In-memory fungible token.
pub struct SandboxToken {
    address: Account,
    book: Mutex<Book>,
}

impl SandboxToken {
    pub fn new(address: Account) -> Self {
        Self {
            address,
            book: Mutex::new(Book::default()),
        }
    }

    fn book(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `amount` new tokens owned by `to`.
    ///
    /// Saturates at `U256::MAX` total supply.
    pub fn mint(&self, to: &Account, amount: U256) {
        let mut book = self.book();
        let minted = amount.min(U256::MAX - book.total_supply);
        book.total_supply += minted;
        let balance = book.balance(to);
        book.balances.insert(*to, balance + minted);
        tracing::debug!(to = %to, amount = %minted, "Sandbox tokens minted");
    }

    pub fn total_supply(&self) -> U256 {
        self.book().total_supply
    }
}

impl Token for SandboxToken {
    fn address(&self) -> Account {
        self.address
    }

    fn balance_of(&self, account: &Account) -> U256 {
        self.book().balance(account)
    }

    fn allowance(&self, owner: &Account, spender: &Account) -> U256 {
        self.book().allowance(owner, spender)
    }

    fn approve(&self, owner: &Account, spender: &Account, amount: U256) {
        self.book().set_allowance(owner, spender, amount);
        tracing::debug!(owner = %owner, spender = %spender, amount = %amount, "Allowance set");
    }

    fn transfer_from(
        &self,
        spender: &Account,
        from: &Account,
        to: &Account,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut book = self.book();

        let allowance = book.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: allowance,
            });
        }
        let balance = book.balance(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        book.set_allowance(from, spender, allowance - amount);
        book.balances.insert(*from, balance - amount);
        // Re-read: `to` may equal `from`.
        let credited = book.balance(to) + amount;
        book.balances.insert(*to, credited);
        Ok(())
    }

    fn approve_and_call<H>(
        &self,
        owner: &Account,
        amount: U256,
        payload: &[u8],
        handler: &H,
    ) -> Result<H::Receipt, WireError>
    where
        H: ApprovalHandler + ?Sized,
    {
        let spender = handler.spender();
        let previous = {
            let mut book = self.book();
            let previous = book.allowance(owner, &spender);
            book.set_allowance(owner, &spender, amount);
            previous
        };

        // The lock is released: the handler calls back into `transfer_from`.
        match handler.receive_approval(&self.address, owner, amount, payload) {
            Ok(receipt) => Ok(receipt),
            Err(err) if err.funds_moved() => {
                // No rollback for a consumed allowance. The settlement
                // stands without a ledger record; see the error log.
                tracing::warn!(owner = %owner, error = %err, "Approve-and-call settled but unrecorded");
                Err(err)
            }
            Err(err) => {
                self.book().set_allowance(owner, &spender, previous);
                tracing::debug!(owner = %owner, error = %err, "Approve-and-call rolled back");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerDbError;

    fn token() -> SandboxToken {
        SandboxToken::new(Account::repeat_byte(0x70))
    }

    fn alice() -> Account {
        Account::repeat_byte(0x01)
    }

    fn bob() -> Account {
        Account::repeat_byte(0x02)
    }

    fn spender() -> Account {
        Account::repeat_byte(0xee)
    }

    fn amount(value: u64) -> U256 {
        U256::from(value)
    }

    #[test]
    fn mint_and_transfer_from() {
        let token = token();
        token.mint(&alice(), amount(100));
        token.approve(&alice(), &spender(), amount(30));

        token
            .transfer_from(&spender(), &alice(), &bob(), amount(10))
            .unwrap();

        assert_eq!(token.balance_of(&alice()), amount(90));
        assert_eq!(token.balance_of(&bob()), amount(10));
        assert_eq!(token.allowance(&alice(), &spender()), amount(20));
        assert_eq!(token.total_supply(), amount(100));
    }

    #[test]
    fn over_allowance_changes_nothing() {
        let token = token();
        token.mint(&alice(), amount(100));
        token.approve(&alice(), &spender(), amount(10));

        let err = token
            .transfer_from(&spender(), &alice(), &bob(), amount(20))
            .unwrap_err();

        assert_eq!(
            err,
            TokenError::InsufficientAllowance {
                required: amount(20),
                available: amount(10)
            }
        );
        assert_eq!(token.balance_of(&alice()), amount(100));
        assert_eq!(token.balance_of(&bob()), U256::ZERO);
        assert_eq!(token.allowance(&alice(), &spender()), amount(10));
    }

    #[test]
    fn over_balance_changes_nothing() {
        let token = token();
        token.mint(&alice(), amount(5));
        token.approve(&alice(), &spender(), amount(50));

        let err = token
            .transfer_from(&spender(), &alice(), &bob(), amount(20))
            .unwrap_err();

        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        assert_eq!(token.balance_of(&alice()), amount(5));
        assert_eq!(token.allowance(&alice(), &spender()), amount(50));
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let token = token();
        token.mint(&alice(), amount(10));
        token.approve(&alice(), &spender(), amount(10));

        token
            .transfer_from(&spender(), &alice(), &alice(), amount(10))
            .unwrap();

        assert_eq!(token.balance_of(&alice()), amount(10));
        assert_eq!(token.allowance(&alice(), &spender()), U256::ZERO);
    }

    struct Recorder {
        fail: bool,
    }

    impl ApprovalHandler for Recorder {
        type Receipt = U256;

        fn spender(&self) -> Account {
            spender()
        }

        fn receive_approval(
            &self,
            _token: &Account,
            _from: &Account,
            amount: U256,
            payload: &[u8],
        ) -> Result<U256, WireError> {
            if self.fail {
                Err(WireError::MalformedPayload(format!("{} bytes", payload.len())))
            } else {
                Ok(amount)
            }
        }
    }

    #[test]
    fn approve_and_call_sets_allowance_before_notifying() {
        let token = token();
        let receipt = token
            .approve_and_call(&alice(), amount(7), &[], &Recorder { fail: false })
            .unwrap();

        assert_eq!(receipt, amount(7));
        assert_eq!(token.allowance(&alice(), &spender()), amount(7));
    }

    /// Transfers through the token, then reports the ledger commit failing.
    struct SettlesWithoutRecord<'a> {
        token: &'a SandboxToken,
    }

    impl ApprovalHandler for SettlesWithoutRecord<'_> {
        type Receipt = ();

        fn spender(&self) -> Account {
            spender()
        }

        fn receive_approval(
            &self,
            _token: &Account,
            from: &Account,
            amount: U256,
            _payload: &[u8],
        ) -> Result<(), WireError> {
            self.token.transfer_from(&spender(), from, &bob(), amount)?;
            Err(WireError::Unrecorded(LedgerDbError::Corrupt(
                "commit failed".to_string(),
            )))
        }
    }

    #[test]
    fn approve_and_call_keeps_consumed_allowance_when_unrecorded() {
        let token = token();
        token.mint(&alice(), amount(10));
        token.approve(&alice(), &spender(), amount(3));

        let err = token
            .approve_and_call(&alice(), amount(7), &[], &SettlesWithoutRecord { token: &token })
            .unwrap_err();

        assert!(err.funds_moved());
        assert_eq!(token.balance_of(&bob()), amount(7));
        assert_eq!(token.balance_of(&alice()), amount(3));
        assert_eq!(token.allowance(&alice(), &spender()), U256::ZERO);
    }

    #[test]
    fn approve_and_call_restores_allowance_on_failure() {
        let token = token();
        token.approve(&alice(), &spender(), amount(3));

        let err = token
            .approve_and_call(&alice(), amount(7), &[1, 2], &Recorder { fail: true })
            .unwrap_err();

        assert!(matches!(err, WireError::MalformedPayload(_)));
        assert_eq!(token.allowance(&alice(), &spender()), amount(3));
    }
}
