//! Password hashing via bcrypt.

use crate::errors::AppError;

/// bcrypt cost factor.
#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt hash: {e}")))
}

/// Verify a password against a stored hash. A malformed hash counts as a
/// mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
