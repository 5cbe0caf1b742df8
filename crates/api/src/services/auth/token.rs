//! Signed session tokens.
//!
//! A token is an HS256 JWT carrying the subject id, the role and an absolute
//! expiry 24 hours after issue. Tokens are never refreshed; a new one is
//! minted on each login.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use localiza_core::{AccountId, Role};

use crate::models::AuthContext;

/// Lifetime of a freshly issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Bad signature, malformed structure, unknown role or past expiry.
    #[error("invalid session token")]
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    exp: i64,
}

/// Issues and verifies session tokens with one process-wide key.
///
/// The key is handed in at construction; nothing here reads the environment.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the token cannot be encoded.
    pub fn issue(&self, subject: AccountId, role: Role) -> Result<String, TokenError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if it had been minted at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the token cannot be encoded.
    pub fn issue_at(
        &self,
        subject: AccountId,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.as_str().to_owned(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for any token this codec did not issue
    /// or whose expiry has passed.
    pub fn verify(&self, token: &str) -> Result<AuthContext, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            TokenError::Invalid
        })?;

        let subject = data
            .claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| TokenError::Invalid)?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|_| TokenError::Invalid)?;

        Ok(AuthContext::new(subject, role))
    }
}
