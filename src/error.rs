//! Error types for the admission layer
//!
//! Provides unified error handling using thiserror. The cache and the quota
//! manager absorb their own faults; these errors cover parsing, validation
//! and the administrative HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Gate Error Enum ==
/// Unified error type for the admission layer.
#[derive(Error, Debug)]
pub enum GateError {
    /// Entry not found in cache
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Entry rejected because it cannot fit the memory budget
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Category name not recognised
    #[error("Unknown cache category: {0}")]
    UnknownCategory(String),

    /// Operation name not recognised
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Content or value could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = match &self {
            GateError::NotFound(_) => StatusCode::NOT_FOUND,
            GateError::InvalidRequest(_)
            | GateError::UnknownCategory(_)
            | GateError::UnknownOperation(_) => StatusCode::BAD_REQUEST,
            GateError::CacheFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            GateError::Serialization(_) | GateError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the admission layer.
pub type Result<T> = std::result::Result<T, GateError>;
