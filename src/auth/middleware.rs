//! Auth gate middleware.
//!
//! Two sequential stages: `authenticate` verifies the bearer token and
//! attaches the decoded claims to the request; `require_admin` checks the
//! role claim. Both are pure functions of the request and the process
//! signing key, safe to run concurrently for unrelated requests.

use crate::auth::jwt::{Claims, TokenError, TokenService};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Stage 1: require a valid `Authorization: Bearer <token>` header and
/// inject the decoded claims into the request extensions.
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthGateError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthGateError::NoToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthGateError::InvalidFormat)?;

    let claims = tokens.verify(token).map_err(|e| match e {
        TokenError::Expired => AuthGateError::TokenExpired,
        TokenError::Invalid => AuthGateError::InvalidToken,
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Stage 2: require the authenticated identity to carry the admin role.
///
/// Must be layered after `authenticate`; missing claims here means the
/// router is mis-wired, which is a server fault, not a client one.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthGateError> {
    let claims = match req.extensions().get::<Claims>() {
        Some(claims) => claims,
        None => {
            error!("require_admin ran without authenticate - router wiring bug");
            return Err(AuthGateError::MissingIdentity);
        }
    };

    if claims.role != crate::models::Role::Admin {
        return Err(AuthGateError::AccessDenied);
    }

    Ok(next.run(req).await)
}

/// Auth gate rejections, each with its own user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthGateError {
    NoToken,
    InvalidFormat,
    TokenExpired,
    InvalidToken,
    MissingIdentity,
    AccessDenied,
}

impl IntoResponse for AuthGateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthGateError::NoToken => (StatusCode::FORBIDDEN, "No token provided"),
            AuthGateError::InvalidFormat => (StatusCode::BAD_REQUEST, "Invalid token format"),
            AuthGateError::TokenExpired => (StatusCode::FORBIDDEN, "Token expired"),
            AuthGateError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid token"),
            AuthGateError::MissingIdentity => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AuthGateError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied"),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
