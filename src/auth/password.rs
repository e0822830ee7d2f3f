// Password hashing and validation service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::auth::error::AuthError;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a per-account random salt.
    ///
    /// Two accounts registering the same password produce distinct digests.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        Self::validate_password_strength(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| AuthError::PasswordHashError)?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC-format hash.
    ///
    /// A mismatch is `Ok(false)`; a malformed stored hash is an error.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHashError)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(AuthError::PasswordHashError),
        }
    }

    /// Validate password length bounds before hashing.
    ///
    /// The upper bound caps hashing cost on attacker-supplied input.
    pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_round_trip() {
        let password = "correct horse battery staple";
        let hash = PasswordService::hash_password(password).unwrap();

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordService::verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = PasswordService::hash_password("right-password").unwrap();
        assert!(!PasswordService::verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_distinct_digests() {
        let first = PasswordService::hash_password("shared-password").unwrap();
        let second = PasswordService::hash_password("shared-password").unwrap();

        // Per-account random salt: equal plaintexts never collide at rest.
        assert_ne!(first, second);
        assert!(PasswordService::verify_password("shared-password", &first).unwrap());
        assert!(PasswordService::verify_password("shared-password", &second).unwrap());
    }

    #[test]
    fn test_too_short_password_rejected() {
        assert!(PasswordService::hash_password("short").is_err());
    }

    #[test]
    fn test_too_long_password_rejected() {
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(PasswordService::hash_password(&long).is_err());
    }

    #[test]
    fn test_malformed_stored_hash_is_error() {
        assert!(PasswordService::verify_password("whatever", "not-a-phc-string").is_err());
    }
}
