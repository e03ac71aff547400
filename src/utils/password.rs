use bcrypt::{DEFAULT_COST, hash, verify};

use crate::utils::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// One-way check of a presented password against a stored bcrypt hash.
/// The comparison inside bcrypt is constant-time; the plaintext is never
/// reconstructed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}
