// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    http::StatusCode,
    routing::any,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info_span;
use utoipa::OpenApi;

use crate::{
    accounts::{Account, Chain},
    deriver::KeyRecord,
    error::{ApiError, FacadeError},
    models::{AddressResponse, HealthzResponse, QuoteRecord},
    state::AppState,
    tappd::{QuoteHashAlgorithm, TdxQuoteResponse},
};

pub mod attestation;
pub mod env;
pub mod health;
pub mod keys;

pub fn router(state: AppState) -> Router {
    let business_routes = Router::new()
        .route("/", any(attestation::info))
        .route("/info", any(attestation::info))
        .route("/get_quote", any(attestation::get_quote))
        .route("/tdx_quote", any(attestation::get_quote))
        .route("/tdx_quote_raw", any(attestation::tdx_quote_raw))
        .route("/get_key", any(keys::get_key))
        .route("/derive_key", any(keys::get_key))
        .route("/ethereum", any(keys::ethereum))
        .route("/solana", any(keys::solana))
        .route("/env", any(env::env))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            // Path only: query strings carry key paths and quoted text.
            info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }));

    // Known paths answer every method. Probes stay out of request tracing.
    let mut app = Router::new()
        .merge(business_routes)
        .route("/healthz", any(health::healthz));

    if state.api_docs {
        app = app.route("/openapi.json", any(openapi));
    }

    app.fallback(not_found).with_state(state)
}

/// Plain-text 404 for unknown routes.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Feed a handler outcome to the liveness tracker and shape the response.
///
/// Client input errors are returned without touching the tracker.
pub(crate) fn track<T>(
    state: &AppState,
    handler: &str,
    result: Result<T, FacadeError>,
) -> Result<Json<T>, ApiError> {
    match result {
        Ok(value) => {
            state.liveness.record_success();
            Ok(Json(value))
        }
        Err(err) => {
            if err.is_backend_failure() {
                state.liveness.record_failure(handler, &err);
            }
            Err(err.into())
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        attestation::info,
        attestation::get_quote,
        attestation::tdx_quote_raw,
        keys::get_key,
        keys::ethereum,
        keys::solana,
        health::healthz,
        env::env
    ),
    components(
        schemas(
            QuoteRecord,
            TdxQuoteResponse,
            QuoteHashAlgorithm,
            KeyRecord,
            AddressResponse,
            HealthzResponse,
            Account,
            Chain
        )
    ),
    tags(
        (name = "Attestation", description = "tappd info and TDX quotes"),
        (name = "Keys", description = "Key derivation"),
        (name = "Accounts", description = "Chain accounts bound to derived keys"),
        (name = "Health", description = "Backend probe"),
        (name = "Debug", description = "Opt-in diagnostics")
    )
)]
pub struct ApiDoc;
