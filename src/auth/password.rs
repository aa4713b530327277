//! Password hashing primitives.
//!
//! One-way salted bcrypt digests. Verification never propagates an error
//! into the login flow: a malformed digest is simply a failed match.

use anyhow::{Context, Result};
use bcrypt::DEFAULT_COST;

/// A well-formed digest of no real account's password. Login verifies
/// against this when the username does not exist so unknown usernames
/// cost the same as wrong passwords.
pub const DUMMY_DIGEST: &str = "$2b$12$4NyXMLmLczYZ5CbY5JympuVjPPaSuLaLPGNescWdsLLKSRnKuH7G6";

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String> {
    bcrypt::hash(plain, DEFAULT_COST).context("Failed to hash password")
}

/// Verify a plaintext password against a stored digest.
///
/// Returns false for wrong passwords and for digests that are not valid
/// bcrypt output at all.
pub fn verify_password(plain: &str, digest: &str) -> bool {
    bcrypt::verify(plain, digest).unwrap_or(false)
}
