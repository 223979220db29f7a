// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types.
//!
//! [`WireError`] is the single failure taxonomy of the wire core. Every
//! variant aborts the whole operation; nothing in the core retries.
//! [`ApiError`] is its HTTP rendering.

use alloy::primitives::U256;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ledger::LedgerDbError;
use crate::models::Account;
use crate::token::TokenError;

// =============================================================================
// Core Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The caller lacks the capability the operation requires.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        caller: Account,
        action: &'static str,
    },

    #[error("insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    /// Callback payload could not be decoded.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("wire amount must be greater than zero")]
    InvalidAmount,

    #[error("ledger storage error: {0}")]
    Storage(#[from] LedgerDbError),

    /// The token moved the funds but the ledger record failed to commit.
    #[error("funds moved but the wire was not recorded: {0}")]
    Unrecorded(#[source] LedgerDbError),
}

impl WireError {
    pub(crate) fn unauthorized(caller: &Account, action: &'static str) -> Self {
        WireError::Unauthorized {
            caller: *caller,
            action,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            WireError::Unauthorized { .. } => "unauthorized",
            WireError::InsufficientAllowance { .. } => "insufficient_allowance",
            WireError::InsufficientBalance { .. } => "insufficient_balance",
            WireError::MalformedPayload(_) => "malformed_payload",
            WireError::InvalidAmount => "invalid_amount",
            WireError::Storage(_) => "storage_error",
            WireError::Unrecorded(_) => "unrecorded_settlement",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WireError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            WireError::InsufficientAllowance { .. } | WireError::InsufficientBalance { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WireError::MalformedPayload(_) | WireError::InvalidAmount => StatusCode::BAD_REQUEST,
            WireError::Storage(_) | WireError::Unrecorded(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the token already transferred the funds. Undoing an
    /// allowance change is then wrong: the transfer consumed it.
    pub fn funds_moved(&self) -> bool {
        matches!(self, WireError::Unrecorded(_))
    }
}

impl From<TokenError> for WireError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientAllowance {
                required,
                available,
            } => WireError::InsufficientAllowance {
                required,
                available,
            },
            TokenError::InsufficientBalance {
                required,
                available,
            } => WireError::InsufficientBalance {
                required,
                available,
            },
        }
    }
}

// =============================================================================
// API Errors
// =============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

}

impl From<WireError> for ApiError {
    fn from(err: WireError) -> Self {
        match &err {
            WireError::Storage(inner) => {
                tracing::error!(error = %inner, "Ledger storage failure");
            }
            WireError::Unrecorded(inner) => {
                tracing::error!(error = %inner, "Settled wire missing from ledger");
            }
            _ => {}
        }
        Self::new(err.status_code(), err.error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}
