// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated calling account.
//!
//! ```rust,ignore
//! async fn my_handler(Caller(caller): Caller) -> impl IntoResponse {
//!     // caller is an Account proven by a signed token
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind};
use serde::Deserialize;

use super::{AuthConfig, AuthError};
use crate::models::Account;
use crate::state::AppState;

/// Claims read after validation. `exp`, `nbf` and `iss` are checked by
/// `jsonwebtoken` against [`AuthConfig`].
#[derive(Debug, Deserialize)]
struct WireClaims {
    sub: String,
}

/// Extractor for the calling account.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Account);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let caller = verify_jwt(token, &state.auth).inspect_err(|e| {
            tracing::debug!(error_code = e.error_code(), "Rejected caller token");
        })?;

        Ok(Caller(caller))
    }
}

/// Verify the token signature and claims, then read the account from `sub`.
fn verify_jwt(token: &str, config: &AuthConfig) -> Result<Account, AuthError> {
    let token_data = decode::<WireClaims>(token, &config.decoding_key, &config.validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        })?;

    token_data
        .claims
        .sub
        .parse::<Account>()
        .map_err(|_| AuthError::InvalidSubject)
}
