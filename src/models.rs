//! Domain models and typed request/response schemas.
//!
//! Every endpoint speaks one of these structs; handlers never pass
//! free-form JSON values around.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account roles. Closed set: anything else in the store is a data bug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// User account as persisted.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt digest - never serialize
    pub role: Role,
    pub address: String,
    pub phonenumber: String,
    pub email: String,
    pub created_at: String,
}

/// Safe projection of a user, the only shape that crosses the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub address: String,
    pub phonenumber: String,
    pub email: String,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            address: user.address.clone(),
            phonenumber: user.phonenumber.clone(),
            email: user.email.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
    pub created_at: String,
}

/// Create/update payload for a product. All fields required; price and
/// stock must be non-negative (checked before any store access). Absent
/// string fields deserialize to empty and fail `validate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    pub stock: i64,
}

impl ProductPayload {
    pub fn validate(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.category.trim().is_empty()
            && self.price >= 0.0
            && self.stock >= 0
    }
}

/// Create payload for a user account. Absent fields deserialize to
/// empty strings so the handler rejects them alongside blank ones.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateUserPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phonenumber: String,
    #[serde(default)]
    pub email: String,
}

/// Update payload for a user account. The password is not updatable
/// through this endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phonenumber: String,
    #[serde(default)]
    pub email: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response: the bearer token the client attaches to every
/// subsequent request.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}
