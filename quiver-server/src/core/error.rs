use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for gateway operations
#[derive(Debug, Error)]
pub enum QuiverError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    #[error("Offline and not cached: {0}")]
    Offline(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuiverError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Offline(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Serialization(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Implement IntoResponse for Axum integration
impl IntoResponse for QuiverError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, QuiverError>;
