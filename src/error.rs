//! Error taxonomy for the HTTP boundary.
//!
//! NotFound and Validation abort a request before any write; Auth is
//! rejected at the extractor. Failures in the best-effort stages of the
//! completion pipeline never surface here; they are logged and swallowed
//! inside the pipeline itself.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required record (course, lesson, quiz, enrollment, achievement)
    /// is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed input, rejected before any write.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or unparseable identity at the boundary.
    #[error("missing or invalid credentials")]
    Auth,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // User-visible messages stay generic; details go to the log only.
        let (status, message) = match &self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid request".to_string()),
            ApiError::Auth => (StatusCode::UNAUTHORIZED, "authentication required".to_string()),
        };
        tracing::warn!(target: "coursehub_backend", error = %self, status = %status, "request rejected");
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
