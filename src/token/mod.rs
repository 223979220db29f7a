// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token collaborator.
//!
//! The wire core never owns balances. It talks to a fungible token through
//! the [`Token`] trait, shaped after the ERC-20 calls it needs, and receives
//! approve-and-call notifications through [`ApprovalHandler`].
//!
//! [`SandboxToken`] is an in-process implementation used by tests and by the
//! bundled server.

pub mod sandbox;

use alloy::primitives::U256;

use crate::error::WireError;
use crate::models::Account;

pub use sandbox::SandboxToken;

/// Failures reported by the token. Each call is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },
}

/// Receiver of approve-and-call notifications.
///
/// The token sets the allowance of `from` to [`ApprovalHandler::spender`]
/// and then calls [`ApprovalHandler::receive_approval`] before returning.
pub trait ApprovalHandler {
    type Receipt;

    /// Account the approval is granted to.
    fn spender(&self) -> Account;

    fn receive_approval(
        &self,
        token: &Account,
        from: &Account,
        amount: U256,
        payload: &[u8],
    ) -> Result<Self::Receipt, WireError>;
}

/// The subset of ERC-20 the wire engine relies on.
pub trait Token: Send + Sync {
    /// Address identifying this token.
    fn address(&self) -> Account;

    fn balance_of(&self, account: &Account) -> U256;

    fn allowance(&self, owner: &Account, spender: &Account) -> U256;

    /// Set the allowance of `owner` to `spender`, replacing any previous value.
    fn approve(&self, owner: &Account, spender: &Account, amount: U256);

    /// Move `amount` from `from` to `to`, spending the allowance `from`
    /// granted to `spender`.
    fn transfer_from(
        &self,
        spender: &Account,
        from: &Account,
        to: &Account,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Approve `handler` and notify it in one atomic step.
    ///
    /// If the handler fails, the previous allowance is restored and the
    /// handler's error is returned.
    fn approve_and_call<H>(
        &self,
        owner: &Account,
        amount: U256,
        payload: &[u8],
        handler: &H,
    ) -> Result<H::Receipt, WireError>
    where
        H: ApprovalHandler + ?Sized,
        Self: Sized;
}
