//! Users resource. Every operation here sits behind the admin gate.

use crate::api::{ApiError, Body, MessageResponse};
use crate::app::AppState;
use crate::models::{CreateUserPayload, Role, UpdateUserPayload, UserResponse};
use crate::realtime::ResourceKind;
use crate::store::is_unique_violation;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SingleUserResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    pub success: bool,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub message: String,
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::Validation("Invalid user id"))
}

/// GET /api/users (admin)
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state
        .users
        .list()
        .map_err(|e| ApiError::internal("list users", e))?;

    Ok(Json(UserListResponse {
        success: true,
        users: users.iter().map(UserResponse::from_user).collect(),
    }))
}

/// GET /api/users/:id (admin)
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SingleUserResponse>, ApiError> {
    let id = parse_id(&id)?;
    let user = state
        .users
        .get_by_id(&id)
        .map_err(|e| ApiError::internal("get user", e))?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(SingleUserResponse {
        success: true,
        user: UserResponse::from_user(&user),
    }))
}

/// POST /api/users (admin)
pub async fn create_user(
    State(state): State<AppState>,
    Body(payload): Body<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    if payload.username.trim().is_empty()
        || payload.address.trim().is_empty()
        || payload.phonenumber.trim().is_empty()
        || payload.email.trim().is_empty()
    {
        return Err(ApiError::Validation("Missing or invalid user fields"));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters",
        ));
    }

    let role = payload.role.unwrap_or(Role::User);
    let user = state
        .users
        .create(
            &payload.username,
            &payload.password,
            role,
            &payload.address,
            &payload.phonenumber,
            &payload.email,
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username already exists")
            } else {
                ApiError::internal("create user", e)
            }
        })?;

    state.notifier.notify(ResourceKind::Users);

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            success: true,
            user_id: user.id,
            message: "User created successfully".to_string(),
        }),
    ))
}

/// PUT /api/users/:id (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(payload): Body<UpdateUserPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if payload.username.trim().is_empty()
        || payload.address.trim().is_empty()
        || payload.phonenumber.trim().is_empty()
        || payload.email.trim().is_empty()
    {
        return Err(ApiError::Validation("Missing or invalid user fields"));
    }

    let found = state
        .users
        .update(&id, &payload)
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username already exists")
            } else {
                ApiError::internal("update user", e)
            }
        })?;
    if !found {
        return Err(ApiError::NotFound("User not found"));
    }

    state.notifier.notify(ResourceKind::Users);

    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// DELETE /api/users/:id (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;

    let found = state
        .users
        .delete(&id)
        .map_err(|e| ApiError::internal("delete user", e))?;
    if !found {
        return Err(ApiError::NotFound("User not found"));
    }

    state.notifier.notify(ResourceKind::Users);

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
