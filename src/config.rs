// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`WireConfig`] loaded from
//! them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the ledger database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `WIRE_OWNER_ADDRESS` | Initial registry owner | Required |
//! | `WIRE_ENGINE_ADDRESS` | Address the engine spends allowances as | Required |
//! | `WIRE_TOKEN_ADDRESS` | Address of the token allowed to notify the engine | Required |
//! | `WIRE_SEED_BALANCES` | `addr=amount,...` minted into the sandbox token | Empty |
//! | `WIRE_JWT_SECRET` | HS256 secret caller tokens are signed with (32+ bytes) | Required |
//! | `WIRE_JWT_ISSUER` | Expected `iss` claim of caller tokens | Not checked |
//! | `WIRE_CACHE_CAPACITY` | Receiver timelines kept in memory | `1024` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

use alloy::primitives::U256;

use crate::ledger::DEFAULT_CACHE_CAPACITY;
use crate::models::{parse_amount, Account};

/// Directory holding `wire-ledger.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const HOST_ENV: &str = "HOST";
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;

/// Owner written to a fresh registry. Ignored once an owner is stored.
pub const OWNER_ADDRESS_ENV: &str = "WIRE_OWNER_ADDRESS";

/// Identity of the engine: the spender senders approve, and the ledger
/// writer the owner authorizes at startup.
pub const ENGINE_ADDRESS_ENV: &str = "WIRE_ENGINE_ADDRESS";

/// The only token accepted as the caller of approval notifications.
pub const TOKEN_ADDRESS_ENV: &str = "WIRE_TOKEN_ADDRESS";

/// Comma-separated `address=amount` pairs minted at startup.
pub const SEED_BALANCES_ENV: &str = "WIRE_SEED_BALANCES";

/// Shared secret verifying caller bearer tokens.
pub const JWT_SECRET_ENV: &str = "WIRE_JWT_SECRET";
pub const MIN_JWT_SECRET_LEN: usize = 32;

pub const JWT_ISSUER_ENV: &str = "WIRE_JWT_ISSUER";

pub const CACHE_CAPACITY_ENV: &str = "WIRE_CACHE_CAPACITY";

/// `json` for machine-readable logs, anything else for human-readable.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Token signing secret. Never printed.
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct WireConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub owner: Account,
    pub engine: Account,
    pub token: Account,
    pub seed_balances: Vec<(Account, U256)>,
    pub jwt_secret: JwtSecret,
    pub jwt_issuer: Option<String>,
    pub cache_capacity: usize,
    pub log_format: LogFormat,
}

impl WireConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let data_dir = optional(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let host = optional(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match optional(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    var: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let account = |var: &'static str| -> Result<Account, ConfigError> {
            let raw = optional(var).ok_or(ConfigError::Missing(var))?;
            raw.parse().map_err(|e: crate::models::AccountParseError| {
                ConfigError::Invalid {
                    var,
                    reason: e.to_string(),
                }
            })
        };
        let owner = account(OWNER_ADDRESS_ENV)?;
        let engine = account(ENGINE_ADDRESS_ENV)?;
        let token = account(TOKEN_ADDRESS_ENV)?;

        let seed_balances = match optional(SEED_BALANCES_ENV) {
            Some(raw) => parse_seed_balances(&raw)?,
            None => Vec::new(),
        };

        let jwt_secret = optional(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: JWT_SECRET_ENV,
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }
        let jwt_issuer = optional(JWT_ISSUER_ENV).map(|raw| raw.trim().to_string());

        let cache_capacity = match optional(CACHE_CAPACITY_ENV) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                var: CACHE_CAPACITY_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_CACHE_CAPACITY,
        };

        let log_format = optional(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or_default();

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            bind_addr,
            owner,
            engine,
            token,
            seed_balances,
            jwt_secret: JwtSecret::new(jwt_secret),
            jwt_issuer,
            cache_capacity,
            log_format,
        })
    }
}

fn parse_seed_balances(raw: &str) -> Result<Vec<(Account, U256)>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: SEED_BALANCES_ENV,
        reason,
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<(Account, U256), ConfigError> {
            let (address, amount) = entry
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected address=amount, got `{entry}`")))?;
            let account: Account = address.parse().map_err(|e| invalid(format!("{e}")))?;
            let amount = parse_amount(amount).map_err(invalid)?;
            Ok((account, amount))
        })
        .collect()
}
