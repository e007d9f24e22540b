//! Argon2id password hashing, verification, and strength validation.
//!
//! Hashes are stored in PHC string format so the algorithm parameters and
//! salt travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Minimum password length accepted on signup and password change.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it does not.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Passwords must be at least `min_length` characters of letters and digits.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    if !password.chars().all(char::is_alphanumeric) {
        return Err("Password may only contain letters and digits".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correcthorse42";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_wrong_password_fails() {
        let hash = hash_password("realpassword1").expect("hashing should succeed");
        assert!(!verify_password("wrongpassword1", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_password_too_short() {
        let msg = validate_password_strength("short1", MIN_PASSWORD_LENGTH).unwrap_err();
        assert!(msg.contains("at least 8 characters"));
    }

    #[test]
    fn test_password_rejects_symbols() {
        assert!(validate_password_strength("with space1", MIN_PASSWORD_LENGTH).is_err());
        assert!(validate_password_strength("symbols!!1", MIN_PASSWORD_LENGTH).is_err());
    }

    #[test]
    fn test_password_meets_minimum() {
        assert!(validate_password_strength("abcd1234", MIN_PASSWORD_LENGTH).is_ok());
    }
}
