// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::track;
use crate::{
    error::{ApiError, FacadeError},
    models::HealthzResponse,
    state::AppState,
};

/// Backend probe.
///
/// Calls tappd `Info` and feeds the outcome to the liveness tracker, so an
/// orchestrator polling this endpoint also drives the restart policy when
/// no business traffic is flowing.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    responses(
        (status = 200, description = "tappd is answering", body = HealthzResponse),
        (status = 503, description = "tappd is unavailable")
    )
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthzResponse>, ApiError> {
    let result = state
        .backend
        .info()
        .await
        .map(|_| HealthzResponse { ok: true })
        .map_err(FacadeError::from);
    track(&state, "healthz", result)
}
