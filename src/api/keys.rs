// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key derivation and account handlers.
//!
//! Key material lives only for the duration of a handler call; it is wiped
//! when the [`KeyMaterial`] value drops.

use axum::{
    extract::{Query, State},
    Json,
};

use super::track;
use crate::{
    accounts::{ethereum_account, solana_account, Account, AccountError},
    deriver::{KeyMaterial, KeyRecord},
    error::{ApiError, FacadeError},
    models::{AddressResponse, KeyQuery},
    state::AppState,
};

/// Derived key for `key` with its certificate chain.
#[utoipa::path(
    get,
    path = "/get_key",
    tag = "Keys",
    params(KeyQuery),
    responses(
        (status = 200, description = "Derived key record", body = KeyRecord),
        (status = 503, description = "Attestation backend unavailable")
    )
)]
pub async fn get_key(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<KeyRecord>, ApiError> {
    let result = state
        .deriver
        .derive(query.key.as_deref())
        .await
        .map(|material| material.to_record())
        .map_err(FacadeError::from);
    track(&state, "get_key", result)
}

/// Ethereum address bound to the key derived for `key`.
#[utoipa::path(
    get,
    path = "/ethereum",
    tag = "Accounts",
    params(KeyQuery),
    responses(
        (status = 200, description = "Checksummed address", body = AddressResponse),
        (status = 503, description = "Attestation backend unavailable")
    )
)]
pub async fn ethereum(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<AddressResponse>, ApiError> {
    let result = derive_address(&state, query.key.as_deref(), ethereum_account).await;
    track(&state, "ethereum", result)
}

/// Solana address bound to the key derived for `key`.
#[utoipa::path(
    get,
    path = "/solana",
    tag = "Accounts",
    params(KeyQuery),
    responses(
        (status = 200, description = "Base58 public key", body = AddressResponse),
        (status = 503, description = "Attestation backend unavailable")
    )
)]
pub async fn solana(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<AddressResponse>, ApiError> {
    let result = derive_address(&state, query.key.as_deref(), solana_account).await;
    track(&state, "solana", result)
}

async fn derive_address(
    state: &AppState,
    path: Option<&str>,
    to_account: fn(&KeyMaterial) -> Result<Account, AccountError>,
) -> Result<AddressResponse, FacadeError> {
    let material = state.deriver.derive(path).await?;
    let account = to_account(&material)?;
    Ok(AddressResponse {
        address: account.address,
    })
}
