// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{accounts::AccountError, tappd::TappdError};

/// Failure of a handler's backend/engine pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    /// tappd could not be reached or answered with something unusable.
    #[error("{0}")]
    BackendUnavailable(TappdError),

    #[error("{0}")]
    MalformedKeyMaterial(#[from] AccountError),

    /// Caller supplied input tappd would reject. Not a backend failure.
    #[error("{0}")]
    InvalidReportData(String),
}

impl From<TappdError> for FacadeError {
    fn from(err: TappdError) -> Self {
        match err {
            TappdError::InvalidReportData(message) => FacadeError::InvalidReportData(message),
            other => FacadeError::BackendUnavailable(other),
        }
    }
}

impl FacadeError {
    /// Whether the liveness tracker should count this failure.
    pub fn is_backend_failure(&self) -> bool {
        !matches!(self, FacadeError::InvalidReportData(_))
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<FacadeError> for ApiError {
    fn from(err: FacadeError) -> Self {
        match err {
            FacadeError::InvalidReportData(message) => ApiError::bad_request(message),
            other => ApiError::service_unavailable(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let down = ApiError::service_unavailable("down");
        assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(down.message, "down");
    }

    #[test]
    fn backend_errors_map_to_503_with_message() {
        let err: FacadeError = TappdError::Transport("connection refused".into()).into();
        assert!(err.is_backend_failure());

        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.message, "tappd request failed: connection refused");
    }

    #[test]
    fn malformed_key_material_maps_to_503() {
        let err = FacadeError::from(AccountError::MalformedKeyMaterial {
            expected: 32,
            actual: 0,
        });
        assert!(err.is_backend_failure());
        assert_eq!(
            ApiError::from(err).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn invalid_report_data_is_a_client_error() {
        let err: FacadeError = TappdError::InvalidReportData("too long".into()).into();
        assert!(!err.is_backend_failure());
        assert_eq!(ApiError::from(err).status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::service_unavailable("tappd down").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"tappd down"}"#);
    }
}
