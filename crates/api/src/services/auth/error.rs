//! Authentication error types.

use thiserror::Error;

use super::password::PasswordError;
use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] localiza_core::EmailError),

    /// Signup without a display name.
    #[error("name is required")]
    MissingName,

    /// Password rejected by policy or hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// The session names an account that no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// Token signing failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
