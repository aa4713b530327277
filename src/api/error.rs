//! HTTP error taxonomy.
//!
//! Handlers return `Result<_, ApiError>`. Store and driver errors are
//! logged with full detail server-side and mapped to a generic message;
//! SQL text, stack traces, and driver codes never reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or malformed input fields.
    Validation(&'static str),
    /// 401 - bad credentials.
    Authentication(&'static str),
    /// 403 - authenticated but not allowed.
    Forbidden(&'static str),
    /// 404 - id absent.
    NotFound(&'static str),
    /// 409 - store uniqueness constraint.
    Conflict(&'static str),
    /// 500 - anything unexpected; the cause stays in the server log.
    Internal,
}

impl ApiError {
    /// Log the real cause and return the opaque 500.
    pub fn internal(context: &'static str, err: anyhow::Error) -> Self {
        error!(context, error = %err, "Internal error");
        ApiError::Internal
    }
}

/// The only failure body shape the API produces.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
