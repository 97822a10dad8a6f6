//! HTTP error mapping.

use crate::params::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fanout_dispatch::DispatchError;
use serde::Serialize;

/// Errors a delay endpoint can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad query parameters: `400`.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The dispatch failed: `500`.
    #[error("Failed to fetch from httpbin: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(_) => tracing::debug!(error = %self, "Rejected request"),
            ApiError::Dispatch(source) if source.is_internal() => {
                tracing::error!(error = %self, "Dispatch failed")
            }
            ApiError::Dispatch(_) => tracing::warn!(error = %self, "Dispatch failed"),
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
