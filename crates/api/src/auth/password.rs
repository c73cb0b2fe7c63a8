//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Minimum accepted password length for registration and reset.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Argon2 rejects inputs past this; also a sane upper bound for forms.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify a password against a hash. A mismatch returns `Ok(false)`, never
/// an error; the comparison inside argon2 is constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Length bounds check for registration and password-reset payloads.
pub fn validate_password(password: &str) -> Result<(), PasswordValidationError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(PasswordValidationError::TooShort);
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(PasswordValidationError::TooLong);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordValidationError {
    #[error("Password must be at least 8 characters")]
    TooShort,
    #[error("Password must be at most 128 characters")]
    TooLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(verify_password(password, &hash).expect("Verification failed"));
        assert!(!verify_password("wrong_password", &hash).expect("Verification failed"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-input").unwrap();
        let b = hash_password("same-input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash_string() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_length_validation() {
        assert!(matches!(
            validate_password("short"),
            Err(PasswordValidationError::TooShort)
        ));
        let long = "a".repeat(MAX_PASSWORD_LEN + 1);
        assert!(matches!(
            validate_password(&long),
            Err(PasswordValidationError::TooLong)
        ));
        assert!(validate_password("long-enough-password").is_ok());
    }
}
