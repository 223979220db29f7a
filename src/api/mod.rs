// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::U256;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        parse_amount, Account, ApproveAndCallRequest, ApproveRequest, DelegatedWireRequest,
        HasSentResponse, MembershipStatus, MintRequest, OwnerResponse, TokenBalanceResponse,
        TransferOwnershipRequest, WireReceipt, WireRequest,
    },
    state::AppState,
};

pub mod access;
pub mod health;
pub mod token;
pub mod wires;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wires", post(wires::send_wire))
        .route("/wires/delegated", post(wires::send_delegated_wire))
        .route("/wires/{receiver}", get(wires::list_wires))
        .route("/wires/{receiver}/sent", get(wires::has_sent))
        .route("/whitelist", get(access::list_whitelist))
        .route(
            "/whitelist/{address}",
            get(access::whitelist_status)
                .put(access::add_to_whitelist)
                .delete(access::remove_from_whitelist),
        )
        .route("/writers", get(access::list_writers))
        .route(
            "/writers/{address}",
            put(access::authorize_writer).delete(access::revoke_writer),
        )
        .route(
            "/owner",
            get(access::get_owner).put(access::transfer_ownership),
        )
        .route("/token/balances/{address}", get(token::get_balance))
        .route("/token/approve", post(token::approve))
        .route("/token/approve-and-call", post(token::approve_and_call))
        .route("/token/mint", post(token::mint));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Parse an address from a path segment or request field.
pub(crate) fn parse_account(raw: &str) -> Result<Account, ApiError> {
    raw.parse::<Account>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

pub(crate) fn parse_amount_field(raw: &str) -> Result<U256, ApiError> {
    parse_amount(raw).map_err(ApiError::bad_request)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        wires::send_wire,
        wires::send_delegated_wire,
        wires::list_wires,
        wires::has_sent,
        access::list_whitelist,
        access::whitelist_status,
        access::add_to_whitelist,
        access::remove_from_whitelist,
        access::list_writers,
        access::authorize_writer,
        access::revoke_writer,
        access::get_owner,
        access::transfer_ownership,
        token::get_balance,
        token::approve,
        token::approve_and_call,
        token::mint
    ),
    components(
        schemas(
            WireRequest,
            DelegatedWireRequest,
            WireReceipt,
            HasSentResponse,
            MembershipStatus,
            OwnerResponse,
            TransferOwnershipRequest,
            TokenBalanceResponse,
            ApproveRequest,
            ApproveAndCallRequest,
            MintRequest,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Wires", description = "Token wires and wire history"),
        (name = "Access", description = "Delegate whitelist, ledger writers and ownership"),
        (name = "Token", description = "Sandbox token operations")
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme referenced by authenticated endpoints.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{bearer, engine, owner, receiver, sender, test_state};
    use crate::token::Token;
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, caller: &Account, body: serde_json::Value) -> Request<Body> {
        post_with_auth(uri, &bearer(caller), body)
    }

    fn post_with_auth(uri: &str, authorization: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(AUTHORIZATION, authorization)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let _ = router(state).into_make_service();
    }

    #[tokio::test]
    async fn approve_wire_and_query_over_http() {
        let (state, _dir) = test_state();
        let app = router(state);

        let (status, _) = send(
            app.clone(),
            post_json(
                "/v1/token/approve",
                &sender(),
                serde_json::json!({ "amount": "10" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, receipt) = send(
            app.clone(),
            post_json(
                "/v1/wires",
                &sender(),
                serde_json::json!({ "receiver": receiver().to_string(), "amount": "10" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["seq"], 0);
        assert_eq!(receipt["amount"], "10");

        let (status, body) = send(
            app.clone(),
            get(&format!("/v1/wires/{}/sent?amount=10&since=0", receiver())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_sent"], true);
        assert_eq!(body["total"], "10");

        let (status, body) = send(app, get(&format!("/v1/wires/{}", receiver()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn over_allowance_maps_to_422() {
        let (state, _dir) = test_state();
        let app = router(state);

        let (status, body) = send(
            app,
            post_json(
                "/v1/wires",
                &sender(),
                serde_json::json!({ "receiver": receiver().to_string(), "amount": "20" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_code"], "insufficient_allowance");
    }

    #[tokio::test]
    async fn non_owner_whitelist_change_is_forbidden() {
        let (state, _dir) = test_state();
        let app = router(state);

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/v1/whitelist/{}", sender()))
            .header(AUTHORIZATION, bearer(&sender()))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "unauthorized");

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/v1/whitelist/{}", sender()))
            .header(AUTHORIZATION, bearer(&owner()))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], true);
    }

    #[tokio::test]
    async fn missing_bearer_token_is_rejected() {
        let (state, _dir) = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/wires")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "receiver": receiver().to_string(), "amount": "1" })
                    .to_string(),
            ))
            .unwrap();

        let (status, body) = send(router(state), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    /// A plain address, or a token for the victim signed with another key,
    /// must not move the victim's approved funds nor act as the owner.
    #[tokio::test]
    async fn forged_identity_cannot_spend_or_mint() {
        let (state, _dir) = test_state();
        state.token.approve(&sender(), &engine(), U256::from(100u64));
        let app = router(state.clone());

        let forged = |account: &Account| {
            let claims = serde_json::json!({
                "sub": account.to_string(),
                "exp": chrono::Utc::now().timestamp() + 3600,
            });
            let token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(b"attacker-chosen-secret-attacker-chosen"),
            )
            .unwrap();
            format!("Bearer {token}")
        };
        let wire = serde_json::json!({ "receiver": receiver().to_string(), "amount": "100" });
        let mint = serde_json::json!({ "account": receiver().to_string(), "amount": "1000000" });

        for authorization in [forged(&sender()), format!("Bearer {}", sender())] {
            let (status, _) = send(
                app.clone(),
                post_with_auth("/v1/wires", &authorization, wire.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let legacy = Request::builder()
            .method("POST")
            .uri("/v1/token/mint")
            .header("x-wire-caller", owner().to_string())
            .header("content-type", "application/json")
            .body(Body::from(mint.to_string()))
            .unwrap();
        let (status, _) = send(app.clone(), legacy).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            app,
            post_with_auth("/v1/token/mint", &forged(&owner()), mint),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_signature");

        assert_eq!(state.token.balance_of(&sender()), U256::from(1_000u64));
        assert_eq!(state.token.balance_of(&receiver()), U256::ZERO);
        assert!(state.ledger.is_empty().unwrap());
    }

    #[tokio::test]
    async fn writers_listing_includes_engine() {
        let (state, _dir) = test_state();
        let (status, body) = send(router(state), get("/v1/writers")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([engine().to_string()]));
    }
}
