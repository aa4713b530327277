//! Client session store.
//!
//! Holds the bearer token and the logged-in user. The token survives
//! restarts in a small file (the local-storage analog); on load it is
//! validated against the server before the session counts as
//! authenticated. Logout is client-side only - the server never revokes
//! a token early.

use crate::client::{ApiClient, ClientError};
use crate::models::{Role, UserResponse};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct Session {
    token_path: PathBuf,
    user: Option<UserResponse>,
}

impl Session {
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
            user: None,
        }
    }

    /// Authenticate, persist the token, and load the user profile.
    pub async fn login(
        &mut self,
        client: &ApiClient,
        username: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let token = client.login(username, password).await?;
        if let Err(e) = fs::write(&self.token_path, &token) {
            // A session that can't persist still works for this process.
            debug!(error = %e, "Could not persist token");
        }
        self.user = Some(client.me().await?);
        Ok(())
    }

    /// Validation-on-load: pick up a persisted token and check it against
    /// the server. Any failure (missing file, expired token, deleted
    /// account) leaves the session logged out.
    pub async fn restore(&mut self, client: &ApiClient) -> bool {
        let token = match fs::read_to_string(&self.token_path) {
            Ok(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => return false,
        };

        client.set_token(&token);
        match client.me().await {
            Ok(user) => {
                self.user = Some(user);
                true
            }
            Err(e) => {
                debug!(error = %e, "Persisted token rejected, clearing session");
                self.clear(client);
                false
            }
        }
    }

    /// Drop the token and user. The token itself remains valid until it
    /// expires; only this client forgets it.
    pub fn logout(&mut self, client: &ApiClient) {
        self.clear(client);
    }

    fn clear(&mut self, client: &ApiClient) {
        client.clear_token();
        self.user = None;
        let _ = fs::remove_file(&self.token_path);
    }

    pub fn user(&self) -> Option<&UserResponse> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }
}
