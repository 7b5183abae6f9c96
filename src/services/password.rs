//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so the parameters travel with the hash and
//! verification does not depend on the current defaults.
//!
//! Login failures for unknown accounts go through [`reject_unknown_user`], which
//! still pays for one Argon2 verification.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid password hash format")]
    InvalidHash,

    #[error("password does not match")]
    Mismatch,
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

// Hashed once per process; the password itself is never used to log in.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("dropbyte-unknown-account").ok());

/// Verify `password` against a throwaway hash and report a mismatch.
///
/// Costs the same as a wrong password for an existing account.
pub fn reject_unknown_user(password: &str) -> PasswordError {
    match DUMMY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => tracing::warn!("dummy password hash unavailable"),
    }
    PasswordError::Mismatch
}

/// Build the dummy hash ahead of the first failed login.
pub fn prime_dummy_hash() {
    LazyLock::force(&DUMMY_HASH);
}
