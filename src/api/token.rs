// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sandbox token endpoints.
//!
//! The bundled token lives in process memory; these endpoints let clients
//! fund accounts, grant allowances and use approve-and-call against it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{parse_account, parse_amount_field};
use crate::{
    auth::Caller,
    calldata,
    error::{ApiError, WireError},
    models::{
        Account, ApproveAndCallRequest, ApproveRequest, MintRequest, TokenBalanceResponse,
        WireReceipt,
    },
    state::AppState,
    token::Token,
};

fn balance_response(state: &AppState, address: &Account) -> TokenBalanceResponse {
    TokenBalanceResponse {
        address: address.to_string(),
        balance: state.token.balance_of(address).to_string(),
        engine_allowance: state
            .token
            .allowance(address, &state.engine.address())
            .to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/token/balances/{address}",
    tag = "Token",
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, body = TokenBalanceResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<TokenBalanceResponse>, ApiError> {
    let address = parse_account(&address)?;
    Ok(Json(balance_response(&state, &address)))
}

/// Set the caller's allowance to a spender, the wire engine by default.
#[utoipa::path(
    post,
    path = "/v1/token/approve",
    tag = "Token",
    request_body = ApproveRequest,
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Allowance set"),
        (status = 400, description = "Invalid address or amount"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<ApproveRequest>,
) -> Result<StatusCode, ApiError> {
    let spender = match request.spender.as_deref() {
        Some(raw) => parse_account(raw)?,
        None => state.engine.address(),
    };
    let amount = parse_amount_field(&request.amount)?;

    state.token.approve(&caller, &spender, amount);
    Ok(StatusCode::NO_CONTENT)
}

/// Approve the wire engine and wire in one atomic call.
///
/// If the wire fails before the transfer, the previous allowance is
/// restored.
#[utoipa::path(
    post,
    path = "/v1/token/approve-and-call",
    tag = "Token",
    request_body = ApproveAndCallRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Wire committed", body = WireReceipt),
        (status = 400, description = "Invalid amount or malformed payload"),
        (status = 422, description = "Insufficient balance"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn approve_and_call(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<ApproveAndCallRequest>,
) -> Result<(StatusCode, Json<WireReceipt>), ApiError> {
    let amount = parse_amount_field(&request.amount)?;
    let payload = match (request.receiver.as_deref(), request.payload.as_deref()) {
        (Some(receiver), None) => calldata::encode_receiver(&parse_account(receiver)?),
        (None, Some(hex)) => calldata::payload_from_hex(hex)?,
        _ => {
            return Err(ApiError::bad_request(
                "provide exactly one of `receiver` or `payload`",
            ))
        }
    };

    let record = state
        .token
        .approve_and_call(&caller, amount, &payload, state.engine.as_ref())?;
    Ok((StatusCode::CREATED, Json(WireReceipt::from(&record))))
}

/// Mint sandbox tokens (owner only).
#[utoipa::path(
    post,
    path = "/v1/token/mint",
    tag = "Token",
    request_body = MintRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, body = TokenBalanceResponse),
        (status = 403, description = "Caller is not the owner"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn mint(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<MintRequest>,
) -> Result<Json<TokenBalanceResponse>, ApiError> {
    if caller != state.access.owner() {
        return Err(WireError::unauthorized(&caller, "mint sandbox tokens").into());
    }
    let account = parse_account(&request.account)?;
    let amount = parse_amount_field(&request.amount)?;

    state.token.mint(&account, amount);
    Ok(Json(balance_response(&state, &account)))
}
