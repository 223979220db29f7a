// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire endpoints: direct and delegated sends, history and threshold checks.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{parse_account, parse_amount_field};
use crate::{
    auth::Caller,
    error::ApiError,
    models::{
        DelegatedWireRequest, HasSentQuery, HasSentResponse, HistoryQuery, WireReceipt,
        WireRequest,
    },
    state::AppState,
};

/// Wire tokens from the caller to a receiver.
///
/// The caller must have approved at least `amount` to the wire engine.
#[utoipa::path(
    post,
    path = "/v1/wires",
    tag = "Wires",
    request_body = WireRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Wire committed", body = WireReceipt),
        (status = 400, description = "Invalid address or amount"),
        (status = 422, description = "Insufficient allowance or balance"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn send_wire(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<WireRequest>,
) -> Result<(StatusCode, Json<WireReceipt>), ApiError> {
    let receiver = parse_account(&request.receiver)?;
    let amount = parse_amount_field(&request.amount)?;

    let record = state.engine.wire(&caller, &receiver, amount)?;
    Ok((StatusCode::CREATED, Json(WireReceipt::from(&record))))
}

/// Wire tokens on behalf of a sender. Caller must be a whitelisted delegate.
#[utoipa::path(
    post,
    path = "/v1/wires/delegated",
    tag = "Wires",
    request_body = DelegatedWireRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Wire committed", body = WireReceipt),
        (status = 400, description = "Invalid address or amount"),
        (status = 403, description = "Caller is not a whitelisted delegate"),
        (status = 422, description = "Insufficient allowance or balance"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn send_delegated_wire(
    State(state): State<AppState>,
    Caller(delegate): Caller,
    Json(request): Json<DelegatedWireRequest>,
) -> Result<(StatusCode, Json<WireReceipt>), ApiError> {
    let sender = parse_account(&request.sender)?;
    let receiver = parse_account(&request.receiver)?;
    let amount = parse_amount_field(&request.amount)?;

    let record = state
        .engine
        .wire_from_delegate(&delegate, &sender, &receiver, amount)?;
    Ok((StatusCode::CREATED, Json(WireReceipt::from(&record))))
}

/// List wires received by an account, oldest first.
#[utoipa::path(
    get,
    path = "/v1/wires/{receiver}",
    tag = "Wires",
    params(
        ("receiver" = String, Path, description = "Receiving account"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Wires in the window", body = [WireReceipt]),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn list_wires(
    State(state): State<AppState>,
    Path(receiver): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<WireReceipt>>, ApiError> {
    let receiver = parse_account(&receiver)?;
    let wires = state.ledger.wires_to(&receiver, query.since.unwrap_or(0))?;
    Ok(Json(wires.iter().map(WireReceipt::from).collect()))
}

/// Check whether at least `amount` reached the receiver since `since`.
#[utoipa::path(
    get,
    path = "/v1/wires/{receiver}/sent",
    tag = "Wires",
    params(
        ("receiver" = String, Path, description = "Receiving account"),
        HasSentQuery
    ),
    responses(
        (status = 200, description = "Threshold check", body = HasSentResponse),
        (status = 400, description = "Invalid address or amount")
    )
)]
pub async fn has_sent(
    State(state): State<AppState>,
    Path(receiver): Path<String>,
    Query(query): Query<HasSentQuery>,
) -> Result<Json<HasSentResponse>, ApiError> {
    let receiver = parse_account(&receiver)?;
    let amount = parse_amount_field(&query.amount)?;

    let total = state.engine.sent_since(&receiver, query.since)?;
    Ok(Json(HasSentResponse {
        receiver: receiver.to_string(),
        amount: amount.to_string(),
        since: query.since,
        total: total.to_string(),
        has_sent: total >= amount,
    }))
}
