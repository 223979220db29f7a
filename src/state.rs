// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::access::AccessRegistry;
use crate::auth::AuthConfig;
use crate::clock::SystemClock;
use crate::config::WireConfig;
use crate::engine::WireEngine;
use crate::error::WireError;
use crate::ledger::{TransferLedger, WireDatabase, LEDGER_DB_FILE};
use crate::token::{SandboxToken, Token};

pub type Engine = WireEngine<SandboxToken, SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub token: Arc<SandboxToken>,
    pub access: Arc<AccessRegistry>,
    pub ledger: Arc<TransferLedger>,
    pub auth: Arc<AuthConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the ledger under `config.data_dir` and wire the service together.
    ///
    /// The registry owner authorizes the engine as a ledger writer, and the
    /// configured seed balances are minted into the sandbox token.
    pub fn bootstrap(config: &WireConfig) -> Result<Self, WireError> {
        let db = Arc::new(WireDatabase::open(&config.data_dir.join(LEDGER_DB_FILE))?);
        let access = Arc::new(AccessRegistry::open(Arc::clone(&db), config.owner)?);

        let owner = access.owner();
        if !access.is_authorized_writer(&config.engine)? {
            access.set_writer_authorization(&owner, &config.engine, true)?;
        }

        let ledger = Arc::new(TransferLedger::new(
            db,
            Arc::clone(&access),
            config.cache_capacity,
        ));

        let token = Arc::new(SandboxToken::new(config.token));
        for (account, amount) in &config.seed_balances {
            token.mint(account, *amount);
        }

        let engine = Arc::new(WireEngine::new(
            config.engine,
            Arc::clone(&token),
            Arc::clone(&access),
            Arc::clone(&ledger),
            Arc::new(SystemClock),
        ));

        let auth = Arc::new(AuthConfig::hs256(
            config.jwt_secret.expose(),
            config.jwt_issuer.as_deref(),
        ));

        tracing::info!(
            data_dir = %config.data_dir.display(),
            owner = %owner,
            engine = %engine.address(),
            token = %token.address(),
            wires = ledger.len()?,
            seeded = config.seed_balances.len(),
            jwt_issuer = config.jwt_issuer.as_deref().unwrap_or("any"),
            "Wire ledger ready"
        );

        Ok(Self {
            engine,
            token,
            access,
            ledger,
            auth,
            data_dir: config.data_dir.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use alloy::primitives::U256;

    use super::*;
    use crate::config::{JwtSecret, LogFormat};
    use crate::models::Account;

    pub const JWT_SECRET: &str = "wire-ledger-test-secret-0123456789";

    pub fn owner() -> Account {
        Account::repeat_byte(0xaa)
    }

    pub fn engine() -> Account {
        Account::repeat_byte(0xee)
    }

    pub fn token() -> Account {
        Account::repeat_byte(0x70)
    }

    /// Funded with 1000 tokens.
    pub fn sender() -> Account {
        Account::repeat_byte(0x11)
    }

    pub fn receiver() -> Account {
        Account::repeat_byte(0x22)
    }

    pub fn config(dir: &tempfile::TempDir) -> WireConfig {
        WireConfig {
            data_dir: dir.path().to_path_buf(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            owner: owner(),
            engine: engine(),
            token: token(),
            seed_balances: vec![(sender(), U256::from(1_000u64))],
            jwt_secret: JwtSecret::new(JWT_SECRET),
            jwt_issuer: None,
            cache_capacity: 16,
            log_format: LogFormat::Pretty,
        }
    }

    /// `Authorization` header value proving `account`, valid for an hour.
    pub fn bearer(account: &Account) -> String {
        let claims = serde_json::json!({
            "sub": account.to_string(),
            "exp": chrono::Utc::now().timestamp() + 3600,
        });
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    pub fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::bootstrap(&config(&dir)).unwrap();
        (state, dir)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::test_support::*;
    use super::*;

    #[test]
    fn bootstrap_authorizes_engine_and_seeds() {
        let (state, _dir) = test_state();

        assert_eq!(state.access.owner(), owner());
        assert!(state.access.is_authorized_writer(&engine()).unwrap());
        assert_eq!(state.token.balance_of(&sender()), U256::from(1_000u64));
        assert!(state.ledger.is_empty().unwrap());
    }

    #[test]
    fn bootstrap_reopens_existing_ledger() {
        let dir = tempfile::tempdir().unwrap();
        {
            let state = AppState::bootstrap(&config(&dir)).unwrap();
            state
                .token
                .approve(&sender(), &engine(), U256::from(10u64));
            state
                .engine
                .wire(&sender(), &receiver(), U256::from(10u64))
                .unwrap();
        }

        let state = AppState::bootstrap(&config(&dir)).unwrap();
        assert_eq!(state.ledger.len().unwrap(), 1);
        assert_eq!(
            state.engine.sent_since(&receiver(), 0).unwrap(),
            U256::from(10u64)
        );
    }
}
