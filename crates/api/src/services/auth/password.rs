//! Password policy and Argon2id hashing.
//!
//! Hashing and verification run on the blocking pool so a burst of logins
//! does not stall the async workers.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("password hashing failed")]
    Hashing,
}

/// # Errors
///
/// Returns `PasswordError::TooShort` below [`MIN_PASSWORD_LENGTH`] characters.
pub fn check_policy(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::Hashing` if Argon2 fails or the blocking task is
/// lost.
pub async fn hash(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| PasswordError::Hashing)
    })
    .await
    .map_err(|_| PasswordError::Hashing)?
}

/// Hash with the default Argon2 parameters that no login password is
/// compared against for real. Built on first use.
static DECOY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"localiza-decoy-credential", &salt)
        .ok()
        .map(|hash| hash.to_string())
});

fn verify_blocking(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Check a password against a stored hash in constant time.
///
/// A malformed stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns `PasswordError::Hashing` only if the blocking task is lost.
pub async fn verify(password: String, stored_hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash))
        .await
        .map_err(|_| PasswordError::Hashing)
}

/// Run one full verification against the decoy hash and discard the result.
///
/// Login calls this when there is no account to check, so a missing account
/// costs the same Argon2 work as a wrong password.
///
/// # Errors
///
/// Returns `PasswordError::Hashing` only if the blocking task is lost.
pub async fn verify_decoy(password: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || {
        if let Some(decoy) = DECOY_HASH.as_deref() {
            verify_blocking(&password, decoy);
        }
    })
    .await
    .map_err(|_| PasswordError::Hashing)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_counts_characters() {
        assert!(check_policy("pw123456").is_ok());
        assert!(matches!(
            check_policy("pw12345"),
            Err(PasswordError::TooShort { min: 8 })
        ));
        assert!(check_policy("").is_err());
    }

    #[tokio::test]
    async fn test_hash_is_salted() {
        let first = hash("pw123456".to_owned()).await.unwrap();
        let second = hash("pw123456".to_owned()).await.unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_verify_accepts_only_the_original() {
        let stored = hash("pw123456".to_owned()).await.unwrap();
        assert!(verify("pw123456".to_owned(), stored.clone()).await.unwrap());
        assert!(!verify("pw1234567".to_owned(), stored.clone()).await.unwrap());
        assert!(!verify("pw12345".to_owned(), stored.clone()).await.unwrap());
        assert!(!verify(String::new(), stored).await.unwrap());
    }

    #[tokio::test]
    async fn test_decoy_uses_default_argon2id_params() {
        let decoy = DECOY_HASH.as_deref().unwrap();
        let real = hash("pw123456".to_owned()).await.unwrap();
        let params = |h: &str| h.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(params(decoy), params(&real));

        verify_decoy("pw123456".to_owned()).await.unwrap();
        assert!(!verify("pw123456".to_owned(), decoy.to_owned()).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_hash() {
        assert!(!verify("pw123456".to_owned(), "not-a-hash".to_owned()).await.unwrap());
    }
}
