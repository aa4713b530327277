//! API client.
//!
//! A thin typed wrapper over reqwest with a bearer-token slot: once a
//! token is set, every outgoing request carries `Authorization: Bearer
//! <token>`, mirroring the request interceptor the web frontend uses.

pub mod live;
pub mod session;

use crate::api::products::{ProductCreatedResponse, ProductListResponse, ProductResponse};
use crate::api::users::{SingleUserResponse, UserCreatedResponse, UserListResponse};
use crate::api::MessageResponse;
use crate::auth::api::MeResponse;
use crate::models::{
    CreateUserPayload, LoginRequest, LoginResponse, Product, ProductPayload, UpdateUserPayload,
    UserResponse,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Client-side failures: either the server answered with an error body,
/// or the request never completed.
#[derive(Debug)]
pub enum ClientError {
    /// Server responded with `{success:false, error}`.
    Api { status: u16, message: String },
    /// Transport-level failure (connect, timeout, decode).
    Transport(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Api { status, message } => write!(f, "{status}: {message}"),
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// `base_url` is scheme+host+port, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn set_token(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Websocket endpoint for the change-event channel.
    pub fn ws_url(&self) -> String {
        let base = self
            .base_url
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{base}/ws")
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let mut req = self.http.request(method, format!("{}{path}", self.base_url));

        // The interceptor: attach the bearer token when we hold one.
        if let Some(token) = self.token() {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|p| p.error)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<T>().await?)
    }

    /// GET a JSON document. Used directly by the live list hook.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(reqwest::Method::GET, path, None).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Transport(e.to_string()))?;
        self.execute(reqwest::Method::POST, path, Some(body)).await
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Transport(e.to_string()))?;
        self.execute(reqwest::Method::PUT, path, Some(body)).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(reqwest::Method::DELETE, path, None).await
    }

    // --- auth ---

    /// Log in and remember the returned token for subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let resp: LoginResponse = self
            .post_json(
                "/api/auth",
                &LoginRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.set_token(&resp.token);
        Ok(resp.token)
    }

    /// Validate the held token against the server's current record.
    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        let resp: MeResponse = self.get_json("/api/auth/me").await?;
        Ok(resp.user)
    }

    // --- products ---

    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let resp: ProductListResponse = self.get_json("/api/products").await?;
        Ok(resp.products)
    }

    pub async fn product(&self, id: &Uuid) -> Result<Product, ClientError> {
        let resp: ProductResponse = self.get_json(&format!("/api/products/{id}")).await?;
        Ok(resp.product)
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Uuid, ClientError> {
        let resp: ProductCreatedResponse = self.post_json("/api/products", payload).await?;
        Ok(resp.product_id)
    }

    pub async fn update_product(
        &self,
        id: &Uuid,
        payload: &ProductPayload,
    ) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .put_json(&format!("/api/products/{id}"), payload)
            .await?;
        Ok(())
    }

    pub async fn delete_product(&self, id: &Uuid) -> Result<(), ClientError> {
        let _: MessageResponse = self.delete_json(&format!("/api/products/{id}")).await?;
        Ok(())
    }

    // --- users ---

    pub async fn users(&self) -> Result<Vec<UserResponse>, ClientError> {
        let resp: UserListResponse = self.get_json("/api/users").await?;
        Ok(resp.users)
    }

    pub async fn user(&self, id: &Uuid) -> Result<UserResponse, ClientError> {
        let resp: SingleUserResponse = self.get_json(&format!("/api/users/{id}")).await?;
        Ok(resp.user)
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<Uuid, ClientError> {
        let resp: UserCreatedResponse = self.post_json("/api/users", payload).await?;
        Ok(resp.user_id)
    }

    pub async fn update_user(
        &self,
        id: &Uuid,
        payload: &UpdateUserPayload,
    ) -> Result<(), ClientError> {
        let _: MessageResponse = self.put_json(&format!("/api/users/{id}"), payload).await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: &Uuid) -> Result<(), ClientError> {
        let _: MessageResponse = self.delete_json(&format!("/api/users/{id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_derivation() {
        let client = ApiClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(client.ws_url(), "ws://127.0.0.1:5000/ws");

        let secure = ApiClient::new("https://shop.example.com").unwrap();
        assert_eq!(secure.ws_url(), "wss://shop.example.com/ws");
    }

    #[test]
    fn test_token_slot() {
        let client = ApiClient::new("http://127.0.0.1:5000").unwrap();
        assert!(client.token().is_none());

        client.set_token("abc");
        assert_eq!(client.token().as_deref(), Some("abc"));

        client.clear_token();
        assert!(client.token().is_none());
    }
}
