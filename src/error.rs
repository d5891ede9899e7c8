use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

/// A payload field that failed validation, and why.
///
/// Produced identically for REST bodies and MCP tool arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Record store lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

/// Errors surfaced by the REST routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    NotFound(#[from] StoreError),
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("malformed request body: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(err) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": err.to_string() }))).into_response()
            }
            ApiError::InvalidInput(err) => {
                tracing::warn!(field = %err.field, reason = %err.reason, "rejected payload");
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": err }))).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": msg }))).into_response()
            }
        }
    }
}
