//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache node.
///
/// `Clone` is required so a single load result can be shared with every
/// waiter of an in-flight request (see the singleflight module).
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Key not found in the cache or its backing data source
    #[error("Key not found: {0}")]
    NotFound(String),

    /// No cache group registered under the given name
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A fetch from a remote peer failed (transport or protocol error)
    #[error("Peer fetch failed: {0}")]
    PeerFetch(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::PeerFetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, CacheError>;
