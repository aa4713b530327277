//! Storehub backend library.
//!
//! Exposes the server modules for the binary and the integration tests,
//! plus the typed API client used by consumers of the service.

pub mod api;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod realtime;
pub mod store;

pub use app::{build_router, AppState};
pub use config::Config;
