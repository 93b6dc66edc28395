//! Argon2id password hashing.
//!
//! Hashing is deliberately slow, so both operations run on the blocking pool.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is not a valid PHC string: {0}")]
    InvalidHash(String),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hashes `password` into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns [`PasswordError`] if hashing fails or the blocking task panics.
pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

/// Returns whether `password` matches the stored PHC `hash`.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidHash`] if `hash` cannot be parsed.
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &hash)).await?
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0_u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_accepts_only_the_original_password() {
        let hash = hash_password("correct horse".to_string())
            .await
            .expect("hash");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse".to_string(), hash.clone())
            .await
            .expect("verify"));
        assert!(!verify_password("wrong horse".to_string(), hash)
            .await
            .expect("verify"));
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let first = hash_password("repeatable".to_string()).await.expect("hash");
        let second = hash_password("repeatable".to_string()).await.expect("hash");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn unparseable_hash_is_an_error() {
        let err = verify_password("x".to_string(), "plaintext".to_string())
            .await
            .expect_err("should fail");
        assert!(matches!(err, PasswordError::InvalidHash(_)));
    }
}
