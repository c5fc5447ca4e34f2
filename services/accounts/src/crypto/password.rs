//! Password hashing with Argon2id.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use tokio::task;

use crate::error::AccountServiceError;

pub fn hash_password(password: &str) -> Result<String, AccountServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against its stored PHC hash. Returns `false` on mismatch
/// or on an unparseable hash — callers must not be able to tell the two apart.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Argon2 is CPU-intensive; run it off the async runtime.
pub async fn hash(password: String) -> Result<String, AccountServiceError> {
    task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("hash task panicked: {e}")))?
}

pub async fn verify(hash: String, password: String) -> Result<bool, AccountServiceError> {
    task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("verify task panicked: {e}")))
}
