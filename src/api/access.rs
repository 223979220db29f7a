// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry administration endpoints.
//!
//! Reads are open. Every mutation requires the caller to be the registry
//! owner and is idempotent.

use axum::{
    extract::{Path, State},
    Json,
};

use super::parse_account;
use crate::{
    auth::Caller,
    error::ApiError,
    models::{Account, MembershipStatus, OwnerResponse, TransferOwnershipRequest},
    state::AppState,
};

fn render(accounts: Vec<Account>) -> Json<Vec<String>> {
    Json(accounts.iter().map(Account::to_string).collect())
}

fn status(address: &Account, allowed: bool) -> Json<MembershipStatus> {
    Json(MembershipStatus {
        address: address.to_string(),
        allowed,
    })
}

// ============================================================================
// Delegate whitelist
// ============================================================================

/// List whitelisted delegates.
#[utoipa::path(
    get,
    path = "/v1/whitelist",
    tag = "Access",
    responses((status = 200, description = "Whitelisted delegates", body = [String]))
)]
pub async fn list_whitelist(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(render(state.access.whitelist()?))
}

#[utoipa::path(
    get,
    path = "/v1/whitelist/{address}",
    tag = "Access",
    params(("address" = String, Path, description = "Delegate address")),
    responses((status = 200, body = MembershipStatus))
)]
pub async fn whitelist_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<MembershipStatus>, ApiError> {
    let address = parse_account(&address)?;
    Ok(status(&address, state.access.is_whitelisted(&address)?))
}

/// Whitelist a delegate (owner only).
#[utoipa::path(
    put,
    path = "/v1/whitelist/{address}",
    tag = "Access",
    params(("address" = String, Path, description = "Delegate address")),
    security(("bearer" = [])),
    responses(
        (status = 200, body = MembershipStatus),
        (status = 403, description = "Caller is not the owner"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn add_to_whitelist(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(address): Path<String>,
) -> Result<Json<MembershipStatus>, ApiError> {
    let address = parse_account(&address)?;
    state.engine.add_address_to_whitelist(&caller, &address)?;
    Ok(status(&address, true))
}

/// Remove a delegate from the whitelist (owner only).
#[utoipa::path(
    delete,
    path = "/v1/whitelist/{address}",
    tag = "Access",
    params(("address" = String, Path, description = "Delegate address")),
    security(("bearer" = [])),
    responses(
        (status = 200, body = MembershipStatus),
        (status = 403, description = "Caller is not the owner"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn remove_from_whitelist(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(address): Path<String>,
) -> Result<Json<MembershipStatus>, ApiError> {
    let address = parse_account(&address)?;
    state
        .engine
        .remove_address_from_whitelist(&caller, &address)?;
    Ok(status(&address, false))
}

// ============================================================================
// Ledger writers
// ============================================================================

#[utoipa::path(
    get,
    path = "/v1/writers",
    tag = "Access",
    responses((status = 200, description = "Authorized ledger writers", body = [String]))
)]
pub async fn list_writers(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(render(state.access.writers()?))
}

/// Allow an account to append to the ledger (owner only).
#[utoipa::path(
    put,
    path = "/v1/writers/{address}",
    tag = "Access",
    params(("address" = String, Path, description = "Writer address")),
    security(("bearer" = [])),
    responses(
        (status = 200, body = MembershipStatus),
        (status = 403, description = "Caller is not the owner"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn authorize_writer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(address): Path<String>,
) -> Result<Json<MembershipStatus>, ApiError> {
    let writer = parse_account(&address)?;
    state
        .access
        .set_writer_authorization(&caller, &writer, true)?;
    Ok(status(&writer, true))
}

/// Revoke an account's ledger write access (owner only).
#[utoipa::path(
    delete,
    path = "/v1/writers/{address}",
    tag = "Access",
    params(("address" = String, Path, description = "Writer address")),
    security(("bearer" = [])),
    responses(
        (status = 200, body = MembershipStatus),
        (status = 403, description = "Caller is not the owner"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn revoke_writer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(address): Path<String>,
) -> Result<Json<MembershipStatus>, ApiError> {
    let writer = parse_account(&address)?;
    state
        .access
        .set_writer_authorization(&caller, &writer, false)?;
    Ok(status(&writer, false))
}

// ============================================================================
// Ownership
// ============================================================================

#[utoipa::path(
    get,
    path = "/v1/owner",
    tag = "Access",
    responses((status = 200, body = OwnerResponse))
)]
pub async fn get_owner(State(state): State<AppState>) -> Json<OwnerResponse> {
    Json(OwnerResponse {
        owner: state.access.owner().to_string(),
    })
}

/// Hand the registry to another account (owner only).
#[utoipa::path(
    put,
    path = "/v1/owner",
    tag = "Access",
    request_body = TransferOwnershipRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, body = OwnerResponse),
        (status = 403, description = "Caller is not the owner"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<TransferOwnershipRequest>,
) -> Result<Json<OwnerResponse>, ApiError> {
    let new_owner = parse_account(&request.new_owner)?;
    state.access.transfer_ownership(&caller, &new_owner)?;
    Ok(Json(OwnerResponse {
        owner: new_owner.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{engine, owner, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn whitelist_round_trip_by_owner() {
        let (state, _dir) = test_state();
        let delegate = Account::repeat_byte(0xd0);

        let Json(added) = add_to_whitelist(
            State(state.clone()),
            Caller(owner()),
            Path(delegate.to_string()),
        )
        .await
        .unwrap();
        assert!(added.allowed);

        let Json(listed) = list_whitelist(State(state.clone())).await.unwrap();
        assert_eq!(listed, vec![delegate.to_string()]);

        let Json(removed) = remove_from_whitelist(
            State(state.clone()),
            Caller(owner()),
            Path(delegate.to_string()),
        )
        .await
        .unwrap();
        assert!(!removed.allowed);

        let Json(current) = whitelist_status(State(state), Path(delegate.to_string()))
            .await
            .unwrap();
        assert!(!current.allowed);
    }

    #[tokio::test]
    async fn writer_changes_require_owner() {
        let (state, _dir) = test_state();
        let intruder = Account::repeat_byte(0x66);

        let err = revoke_writer(
            State(state.clone()),
            Caller(intruder),
            Path(engine().to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(state.access.is_authorized_writer(&engine()).unwrap());
    }

    #[tokio::test]
    async fn invalid_path_address_is_bad_request() {
        let (state, _dir) = test_state();
        let err = whitelist_status(State(state), Path("0x12".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ownership_transfer() {
        let (state, _dir) = test_state();
        let next = Account::repeat_byte(0xbb);

        let Json(response) = transfer_ownership(
            State(state.clone()),
            Caller(owner()),
            Json(TransferOwnershipRequest {
                new_owner: next.to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.owner, next.to_string());

        let Json(current) = get_owner(State(state)).await;
        assert_eq!(current.owner, next.to_string());
    }
}
