// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-administered whitelist and writer registry.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::WireError;
use crate::ledger::{Membership, WireDatabase};
use crate::models::Account;

/// Capability registry consulted at the start of every guarded operation.
///
/// ## Capabilities
///
/// - **Owner** - may change the whitelist, the writer set and the owner
/// - **Whitelisted delegate** - may wire on behalf of any sender that has
///   approved the engine
/// - **Authorized writer** - may append to the transfer ledger
///
/// All mutations are idempotent. A rejected mutation changes nothing.
pub struct AccessRegistry {
    db: Arc<WireDatabase>,
    owner: RwLock<Account>,
}

impl AccessRegistry {
    /// Open the registry stored in `db`.
    ///
    /// On first use `initial_owner` is persisted as the owner. After that the
    /// stored owner wins, so ownership transfers survive restarts.
    pub fn open(db: Arc<WireDatabase>, initial_owner: Account) -> Result<Self, WireError> {
        let owner = match db.get_owner()? {
            Some(stored) => {
                if stored != initial_owner {
                    tracing::warn!(
                        stored = %stored,
                        configured = %initial_owner,
                        "Registry owner differs from configuration, keeping stored owner"
                    );
                }
                stored
            }
            None => {
                db.set_owner(&initial_owner)?;
                tracing::info!(owner = %initial_owner, "Registry owner initialized");
                initial_owner
            }
        };

        Ok(Self {
            db,
            owner: RwLock::new(owner),
        })
    }

    /// Current owner.
    pub fn owner(&self) -> Account {
        *self.owner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_owner(&self, caller: &Account, action: &'static str) -> Result<(), WireError> {
        if *caller == self.owner() {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, action, "Rejected non-owner registry change");
            Err(WireError::unauthorized(caller, action))
        }
    }

    // =========================================================================
    // Delegate whitelist
    // =========================================================================

    pub fn is_whitelisted(&self, address: &Account) -> Result<bool, WireError> {
        Ok(self.db.is_member(Membership::Whitelist, address)?)
    }

    pub fn add_to_whitelist(&self, caller: &Account, address: &Account) -> Result<(), WireError> {
        self.add_many_to_whitelist(caller, std::slice::from_ref(address))
    }

    pub fn remove_from_whitelist(
        &self,
        caller: &Account,
        address: &Account,
    ) -> Result<(), WireError> {
        self.remove_many_from_whitelist(caller, std::slice::from_ref(address))
    }

    /// Whitelist several delegates in one transaction.
    pub fn add_many_to_whitelist(
        &self,
        caller: &Account,
        addresses: &[Account],
    ) -> Result<(), WireError> {
        self.ensure_owner(caller, "change the delegate whitelist")?;
        let changed = self.db.set_members(Membership::Whitelist, addresses, true)?;
        tracing::info!(
            requested = addresses.len(),
            changed,
            "Delegates added to whitelist"
        );
        Ok(())
    }

    /// Remove several delegates in one transaction.
    pub fn remove_many_from_whitelist(
        &self,
        caller: &Account,
        addresses: &[Account],
    ) -> Result<(), WireError> {
        self.ensure_owner(caller, "change the delegate whitelist")?;
        let changed = self.db.set_members(Membership::Whitelist, addresses, false)?;
        tracing::info!(
            requested = addresses.len(),
            changed,
            "Delegates removed from whitelist"
        );
        Ok(())
    }

    /// All whitelisted delegates.
    pub fn whitelist(&self) -> Result<Vec<Account>, WireError> {
        Ok(self.db.list_members(Membership::Whitelist)?)
    }

    // =========================================================================
    // Ledger writers
    // =========================================================================

    pub fn is_authorized_writer(&self, address: &Account) -> Result<bool, WireError> {
        Ok(self.db.is_member(Membership::Writers, address)?)
    }

    /// Grant or revoke the right to append to the ledger.
    pub fn set_writer_authorization(
        &self,
        caller: &Account,
        writer: &Account,
        allowed: bool,
    ) -> Result<(), WireError> {
        self.ensure_owner(caller, "change ledger writers")?;
        self.db
            .set_members(Membership::Writers, std::slice::from_ref(writer), allowed)?;
        tracing::info!(writer = %writer, allowed, "Ledger writer authorization updated");
        Ok(())
    }

    /// All authorized ledger writers.
    pub fn writers(&self) -> Result<Vec<Account>, WireError> {
        Ok(self.db.list_members(Membership::Writers)?)
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Hand the registry to `new_owner`.
    pub fn transfer_ownership(
        &self,
        caller: &Account,
        new_owner: &Account,
    ) -> Result<(), WireError> {
        let mut owner = self.owner.write().unwrap_or_else(PoisonError::into_inner);
        if *caller != *owner {
            tracing::warn!(caller = %caller, "Rejected non-owner ownership transfer");
            return Err(WireError::unauthorized(caller, "transfer registry ownership"));
        }
        self.db.set_owner(new_owner)?;
        let previous = *owner;
        *owner = *new_owner;
        tracing::info!(previous = %previous, owner = %new_owner, "Registry ownership transferred");
        Ok(())
    }
}
