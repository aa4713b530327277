//! Relational store backends (SQLite via rusqlite).
//!
//! Each store owns a database path and opens a connection per call;
//! SQLite serializes the actual writes. Schema creation happens at
//! construction so a fresh deployment needs no migration step.

pub mod products;
pub mod users;

pub use products::ProductStore;
pub use users::UserStore;

/// True when an error came from a UNIQUE constraint, e.g. a duplicate
/// username. Everything else from the driver stays opaque to callers.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
