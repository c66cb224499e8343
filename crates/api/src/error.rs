//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use currency::RateError;
use placement::PlacementError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// A business conflict, such as insufficient stock.
    Conflict(String),
    /// An upstream dependency failed. The detail is logged, not returned.
    Upstream(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(detail) => {
                tracing::error!(error = %detail, "upstream dependency failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream service unavailable, please retry".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        match &err {
            PlacementError::CustomerNotFound(_) | PlacementError::ProductNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            PlacementError::InsufficientStock { .. } => ApiError::Conflict(err.to_string()),
            PlacementError::EmptyOrder
            | PlacementError::InvalidQuantity { .. }
            | PlacementError::DuplicateProduct(_)
            | PlacementError::Order(_) => ApiError::BadRequest(err.to_string()),
            PlacementError::Unavailable(_) => ApiError::Upstream(err.to_string()),
            PlacementError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<RateError> for ApiError {
    fn from(err: RateError) -> Self {
        match &err {
            RateError::UnknownCurrency(_) => ApiError::BadRequest(err.to_string()),
            RateError::Unavailable(_) => ApiError::Upstream(err.to_string()),
        }
    }
}
