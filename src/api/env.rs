// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::BTreeMap;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::not_found;
use crate::state::AppState;

/// Process environment as a JSON object.
///
/// Only served when `EXPOSE_ENV` is enabled; otherwise the path is
/// indistinguishable from an unknown route.
#[utoipa::path(
    get,
    path = "/env",
    tag = "Debug",
    responses(
        (status = 200, description = "Environment variables"),
        (status = 404, description = "Endpoint disabled")
    )
)]
pub async fn env(State(state): State<AppState>) -> Response {
    if !state.expose_env {
        return not_found().await.into_response();
    }

    warn!("Serving process environment on /env");
    Json(environment()).into_response()
}

fn environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, StubBackend};
    use axum::{body::to_bytes, http::StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn disabled_by_default() {
        let (state, _) = test_state(Arc::new(StubBackend::default()), 10);
        let response = env(State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn enabled_dumps_environment() {
        let (state, _) = test_state(Arc::new(StubBackend::default()), 10);
        let response = env(State(state.with_expose_env(true))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: BTreeMap<String, String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, environment());
    }
}
