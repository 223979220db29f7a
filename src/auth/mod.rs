// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Caller Authentication
//!
//! Every state-changing endpoint acts on behalf of an account. The account
//! is taken from the `sub` claim of an HS256 JWT sent as
//! `Authorization: Bearer <token>`, signed with the service's shared secret.
//!
//! ## Claims
//!
//! | Claim | Required | Meaning |
//! |-------|----------|---------|
//! | `sub` | yes | Calling account, `0x`-prefixed hex address |
//! | `exp` | yes | Expiry (seconds since epoch) |
//! | `nbf` | no | Not-before, checked when present |
//! | `iss` | when `WIRE_JWT_ISSUER` is set | Must equal the configured issuer |
//!
//! What the caller may do once identified is decided by [`crate::access`].

mod error;
mod extractor;

pub use error::AuthError;
pub use extractor::Caller;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Key and validation rules for caller tokens.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    pub fn hs256(secret: &[u8], issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}
