//! Token service: issue and verify signed bearer tokens.

use crate::models::{Role, User};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Decoded token payload: the minimal identity a request carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// Why a token failed verification. Expiry and everything else surface
/// as different user-facing messages, so the split matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Issues and verifies process-wide signed tokens. The secret is loaded
/// once at startup; construction is the only place it enters.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for a user with the configured lifetime.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl.as_secs() as usize,
        };

        debug!(
            username = %user.username,
            ttl_secs = self.ttl.as_secs(),
            "Issuing token"
        );

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to sign token")
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        // Zero leeway: a token one second past exp is expired, full stop.
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            password_hash: "hash".to_string(),
            role,
            address: "1 Main St".to_string(),
            phonenumber: "555-0100".to_string(),
            email: "test@example.com".to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = TokenService::new("test-secret-key-12345", Duration::from_secs(3600));
        let user = test_user(Role::User);

        let token = service.issue(&user).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_distinguishable_from_corrupt() {
        let secret = "test-secret-key-12345";
        let service = TokenService::new(secret, Duration::from_secs(3600));
        let user = test_user(Role::User);

        // A token minted two simulated hours ago with a one hour lifetime.
        let then = (Utc::now().timestamp() - 7200) as usize;
        let stale = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: then,
            exp: then + 3600,
        };
        let expired = encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        assert_eq!(service.verify(&expired), Err(TokenError::Expired));

        // A corrupted signature is Invalid, not Expired.
        let good = service.issue(&user).unwrap();
        let mut corrupted = good[..good.len() - 4].to_string();
        corrupted.push_str("AAAA");
        assert_eq!(service.verify(&corrupted), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let a = TokenService::new("secret-a", Duration::from_secs(3600));
        let b = TokenService::new("secret-b", Duration::from_secs(3600));

        let token = a.issue(&test_user(Role::Admin)).unwrap();
        assert_eq!(b.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let service = TokenService::new("test-secret-key-12345", Duration::from_secs(3600));
        assert_eq!(service.verify("not.a.token"), Err(TokenError::Invalid));
        assert_eq!(service.verify(""), Err(TokenError::Invalid));
    }
}
