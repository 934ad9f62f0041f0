//! Salted one-way password hashing (Argon2id, PHC string format).
//!
//! Hashing is CPU-bound and must run inside `tokio::task::spawn_blocking`
//! when called from request handlers; use the `*_blocking` helpers.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::{AppError, AppResult};

/// A stored credential. It can be checked against a candidate password but
/// never serialized or printed.
#[derive(Clone)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wraps a hash read back from a backend.
    pub(crate) fn from_stored(phc: String) -> Self {
        PasswordHash(phc)
    }

    /// PHC string for persisting. Store adapters only.
    pub(crate) fn as_stored(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, plain: &str) -> bool {
        verify_password(plain, &self.0)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

pub fn hash_password(plain: &str) -> AppResult<PasswordHash> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))?
        .to_string();
    Ok(PasswordHash(phc))
}

/// Returns false for a mismatch and for a hash that cannot be parsed.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match argon2::PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid PHC string: {e}");
            false
        }
    }
}

pub async fn hash_password_blocking(plain: String) -> AppResult<PasswordHash> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {e}")))?
}

pub async fn verify_password_blocking(hash: PasswordHash, plain: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || hash.verify(&plain))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification task failed: {e}")))
}
