//! Authentication service.
//!
//! Signup, login and session lookup. Session tokens are issued by
//! [`TokenCodec`] and verified by the session resolver middleware without
//! touching the database.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::PasswordError;
pub use token::{TokenCodec, TokenError};

use localiza_core::Email;

use crate::db::{AccountRepository, RepositoryError};
use crate::models::{Account, AuthContext, NewAccount};

/// Signup input as received from the client.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// A successful login: the account and a freshly minted token.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub account: Account,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    accounts: &'a dyn AccountRepository,
    tokens: &'a TokenCodec,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(accounts: &'a dyn AccountRepository, tokens: &'a TokenCodec) -> Self {
        Self { accounts, tokens }
    }

    /// Register a new customer account.
    ///
    /// Signups always get the `customer` role and no store, whatever the
    /// client sends.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName`, `AuthError::InvalidEmail` or
    /// `AuthError::Password` for bad input and `AuthError::EmailTaken` if the
    /// email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<Account, AuthError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(&registration.email)?;
        password::check_policy(&registration.password)?;

        let password_hash = password::hash(registration.password).await?;
        let phone = registration
            .phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());

        let account = self
            .accounts
            .create(&NewAccount::customer(
                name.to_owned(),
                email,
                phone,
                password_hash,
            ))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Verify credentials and mint a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown or malformed
    /// email and for a wrong password alike. Every failure runs one Argon2
    /// verification so the three cases also take the same time.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let Ok(email) = Email::parse(email) else {
            password::verify_decoy(password.to_owned()).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let Some(credentials) = self.accounts.get_credentials(&email).await? else {
            password::verify_decoy(password.to_owned()).await?;
            tracing::warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify(password.to_owned(), credentials.password_hash).await? {
            tracing::warn!(account_id = %credentials.account.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let account = credentials.account;
        let token = self.tokens.issue(account.id, account.role)?;
        tracing::info!(account_id = %account.id, role = %account.role, "Login succeeded");

        Ok(LoginSession { account, token })
    }

    /// The account behind a resolved session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the account was removed after
    /// the token was issued.
    pub async fn current_account(&self, ctx: &AuthContext) -> Result<Account, AuthError> {
        self.accounts
            .get_by_id(ctx.subject)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{Duration, Instant};

    use secrecy::SecretString;

    use localiza_core::Role;

    use super::*;
    use crate::db::memory::MemoryStore;

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("kR8#vQ2!mZ6@pL4$wN9%tB1^yH7&cJ3*"))
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: "Ana".to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_customer_without_store() {
        let store = MemoryStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);

        let account = service
            .register(registration("A@X.com", "pw123456"))
            .await
            .unwrap();
        assert_eq!(account.role, Role::Customer);
        assert_eq!(account.store_id, None);
        assert_eq!(account.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let store = MemoryStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);

        let mut blank_name = registration("a@x.com", "pw123456");
        blank_name.name = "  ".to_owned();
        assert!(matches!(
            service.register(blank_name).await,
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            service.register(registration("a-at-x.com", "pw123456")).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            service.register(registration("a@x.com", "short")).await,
            Err(AuthError::Password(PasswordError::TooShort { .. }))
        ));
        assert_eq!(store.account_count().await, 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);

        service.register(registration("a@x.com", "pw123456")).await.unwrap();
        assert!(matches!(
            service.register(registration("A@x.com", "pw654321")).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let store = MemoryStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);
        let account = service.register(registration("a@x.com", "pw123456")).await.unwrap();

        let session = service.login("a@x.com", "pw123456").await.unwrap();
        let ctx = codec.verify(&session.token).unwrap();
        assert_eq!(ctx, AuthContext::new(account.id, Role::Customer));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);
        service.register(registration("a@x.com", "pw123456")).await.unwrap();

        for (email, password) in [
            ("a@x.com", "pw1234567"),
            ("a@x.com", ""),
            ("b@x.com", "pw123456"),
            ("not-an-email", "pw123456"),
        ] {
            assert!(matches!(
                service.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    async fn time_failed_logins(service: &AuthService<'_>, email: &str) -> Duration {
        let started = Instant::now();
        for _ in 0..3 {
            assert!(matches!(
                service.login(email, "wrong-password").await,
                Err(AuthError::InvalidCredentials)
            ));
        }
        started.elapsed()
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_password_check() {
        let store = MemoryStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);
        service.register(registration("a@x.com", "pw123456")).await.unwrap();

        // Builds the decoy hash so its one-off cost is not timed
        time_failed_logins(&service, "warm@x.com").await;

        let wrong_password = time_failed_logins(&service, "a@x.com").await;
        let unknown_email = time_failed_logins(&service, "b@x.com").await;
        let malformed_email = time_failed_logins(&service, "not-an-email").await;

        assert!(
            unknown_email * 5 >= wrong_password,
            "unknown {unknown_email:?} vs wrong password {wrong_password:?}"
        );
        assert!(
            malformed_email * 5 >= wrong_password,
            "malformed {malformed_email:?} vs wrong password {wrong_password:?}"
        );
    }
}
