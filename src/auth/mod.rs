//! Authentication: password hashing, token service, and the auth gate.

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{authenticate, require_admin};
