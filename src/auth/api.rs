//! Authentication endpoints: login and token validation.

use crate::api::{ApiError, Body};
use crate::app::AppState;
use crate::auth::jwt::Claims;
use crate::auth::password::{verify_password, DUMMY_DIGEST};
use crate::models::{LoginRequest, LoginResponse, UserResponse};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// POST /api/auth
///
/// Unknown usernames and wrong passwords produce byte-identical
/// responses, and the hash verification runs either way so the two
/// cases cost the same. Nothing here reveals which half failed.
pub async fn login(
    State(state): State<AppState>,
    Body(payload): Body<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Username and password are required"));
    }

    let user = state
        .users
        .get_by_username(&payload.username)
        .map_err(|e| ApiError::internal("login lookup", e))?;

    let user = match user {
        Some(user) => user,
        None => {
            // Burn the same hashing cost as a real verification.
            verify_password(&payload.password, DUMMY_DIGEST);
            warn!(username = %payload.username, "Failed login attempt");
            return Err(ApiError::Authentication("Invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(username = %payload.username, "Failed login attempt");
        return Err(ApiError::Authentication("Invalid credentials"));
    }

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::internal("issue token", e))?;

    info!(username = %user.username, role = user.role.as_str(), "Login successful");

    Ok(Json(LoginResponse {
        success: true,
        token,
    }))
}

/// GET /api/auth/me (post auth gate)
///
/// Re-fetches the persisted identity instead of echoing the claims: a
/// token outliving its account is valid but no longer proof of
/// existence.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MeResponse>, ApiError> {
    let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::NotFound("User not found"))?;

    let user = state
        .users
        .get_by_id(&id)
        .map_err(|e| ApiError::internal("me lookup", e))?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(MeResponse {
        success: true,
        user: UserResponse::from_user(&user),
    }))
}
