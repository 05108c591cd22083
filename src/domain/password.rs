//! Argon2 password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Hash compared against when the email is unknown, so a failed login costs
/// the same whether or not the account exists.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    Password::hash("estate-market-dummy-password")
        .map_err(|e| tracing::error!("Failed to build dummy password hash: {}", e))
        .ok()
});

/// A hashed password. The plain text never outlives `Password::new`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash `plain_text` after checking the minimum length.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Ok(Self {
            hash: Self::hash(plain_text)?,
        })
    }

    /// Wrap a stored hash.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Malformed stored hashes never verify.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }

    /// Burn one verification against a fixed hash. Always returns false.
    pub fn verify_dummy(plain_text: &str) -> bool {
        if let Some(hash) = DUMMY_HASH.as_ref() {
            let _ = Password::from_hash(hash.as_str()).verify(plain_text);
        }
        false
    }

    fn hash(plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let password = Password::new("correct horse battery").unwrap();
        assert!(password.verify("correct horse battery"));
        assert!(!password.verify("wrong horse battery"));
    }

    #[test]
    fn test_stored_hash_verifies() {
        let stored = Password::new("listing-agent-42").unwrap().into_string();
        assert!(Password::from_hash(stored).verify("listing-agent-42"));
    }

    #[test]
    fn test_salts_differ() {
        let a = Password::new("SamePassword123").unwrap();
        let b = Password::new("SamePassword123").unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_length_boundary() {
        assert!(matches!(
            Password::new("short"),
            Err(AppError::Validation(_))
        ));
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!Password::from_hash("not-a-phc-string").verify("anything"));
        assert!(!Password::verify_dummy("anything"));
    }
}
