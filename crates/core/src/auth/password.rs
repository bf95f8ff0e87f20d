//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with
//! the hash.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Verification failed for a reason other than a wrong password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// The stored hash is not a PHC string.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
///
/// # Example
///
/// ```
/// use carteira_core::auth::hash_password;
///
/// let hash = hash_password("S3nha!forte").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a password against a stored PHC hash.
///
/// Returns `Ok(false)` for a wrong password.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = hash_password("S3nha!forte").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("S3nha!forte"));
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("S3nha!forte").unwrap();
        assert!(verify_password("S3nha!forte", &hash).unwrap());
        assert!(!verify_password("s3nha!forte", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(
            hash_password("S3nha!forte").unwrap(),
            hash_password("S3nha!forte").unwrap()
        );
    }

    #[test]
    fn test_garbage_hash() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(PasswordError::InvalidHash)
        ));
    }
}
