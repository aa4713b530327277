//! Environment configuration.
//!
//! All runtime knobs are collected here at startup and injected into the
//! services that need them; nothing reads `std::env` after boot.

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_PATH: &str = "storehub.db";
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub admin_password: String,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// `JWT_SECRET` has no fallback: a server signing tokens with a
    /// guessable default is worse than one that refuses to start.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => bail!("JWT_SECRET must be set (refusing to start without a signing key)"),
        };

        let port = env::var("PORT")
            .ok()
            .map(|v| v.parse::<u16>().context("Invalid PORT"))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let db_path = env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let token_ttl = env::var("JWT_EXPIRES_IN")
            .ok()
            .map(|v| parse_ttl(&v).with_context(|| format!("Invalid JWT_EXPIRES_IN: {v}")))
            .transpose()?
            .unwrap_or(DEFAULT_TOKEN_TTL);

        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        Ok(Self {
            port,
            db_path,
            jwt_secret,
            token_ttl,
            admin_password,
        })
    }
}

/// Parse a token lifetime: `2h`, `30m`, `900s`, or a bare number of seconds.
pub fn parse_ttl(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty duration");
    }

    let (value, unit) = match raw.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&raw[..raw.len() - 1], Some(c)),
        _ => (raw, None),
    };

    let value: u64 = value.parse().context("not a number")?;
    let secs = match unit {
        Some('h') | Some('H') => value * 3600,
        Some('m') | Some('M') => value * 60,
        Some('s') | Some('S') | None => value,
        Some(other) => bail!("unknown duration unit '{other}'"),
    };

    if secs == 0 {
        bail!("duration must be positive");
    }
    Ok(Duration::from_secs(secs))
}
