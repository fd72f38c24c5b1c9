// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation info and TDX quote handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use super::track;
use crate::{
    error::{ApiError, FacadeError},
    models::{QuoteQuery, QuoteRecord, RawQuoteQuery},
    state::AppState,
    tappd::{encode_report_data, QuoteHashAlgorithm},
};

/// Attestation metadata for this CVM, passed through from tappd.
#[utoipa::path(
    get,
    path = "/info",
    tag = "Attestation",
    responses(
        (status = 200, description = "tappd info record"),
        (status = 503, description = "Attestation backend unavailable")
    )
)]
pub async fn info(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state.backend.info().await.map_err(FacadeError::from);
    track(&state, "info", result)
}

/// TDX quote over `text`, hashed by tappd with `hash_algorithm`.
#[utoipa::path(
    get,
    path = "/get_quote",
    tag = "Attestation",
    params(QuoteQuery),
    responses(
        (status = 200, description = "Quote record", body = QuoteRecord),
        (status = 400, description = "Unsupported hash algorithm"),
        (status = 503, description = "Attestation backend unavailable")
    )
)]
pub async fn get_quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<QuoteRecord>, ApiError> {
    let algorithm = match query.hash_algorithm.as_deref() {
        Some(name) => name
            .parse::<QuoteHashAlgorithm>()
            .map_err(FacadeError::from)?,
        None => QuoteHashAlgorithm::default(),
    };
    quote(&state, "get_quote", query.text(), algorithm).await
}

/// TDX quote with `text` placed verbatim in the report data.
#[utoipa::path(
    get,
    path = "/tdx_quote_raw",
    tag = "Attestation",
    params(RawQuoteQuery),
    responses(
        (status = 200, description = "Quote record", body = QuoteRecord),
        (status = 400, description = "Text longer than 64 bytes"),
        (status = 503, description = "Attestation backend unavailable")
    )
)]
pub async fn tdx_quote_raw(
    State(state): State<AppState>,
    Query(query): Query<RawQuoteQuery>,
) -> Result<Json<QuoteRecord>, ApiError> {
    quote(&state, "tdx_quote_raw", query.text(), QuoteHashAlgorithm::Raw).await
}

async fn quote(
    state: &AppState,
    handler: &str,
    text: &str,
    algorithm: QuoteHashAlgorithm,
) -> Result<Json<QuoteRecord>, ApiError> {
    // Oversized raw input is the caller's problem, not tappd's.
    let report_data = encode_report_data(text.as_bytes(), algorithm).map_err(FacadeError::from)?;

    let result = state
        .backend
        .tdx_quote(text.as_bytes(), algorithm)
        .await
        .map(|quote| {
            let rtmrs = match quote.replay_rtmrs() {
                Ok(rtmrs) => Some(rtmrs.to_vec()),
                Err(e) => {
                    debug!(handler, error = %e, "Omitting rtmrs: event log did not replay");
                    None
                }
            };
            QuoteRecord {
                quote,
                report_data,
                rtmrs,
            }
        })
        .map_err(FacadeError::from);

    track(state, handler, result)
}
