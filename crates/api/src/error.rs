//! Unified error handling with Sentry integration.
//!
//! Every service error is folded into [`AppError`], whose variants are the
//! closed taxonomy clients see. Server errors are captured to Sentry before
//! the response is produced; client errors are not.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, PasswordError, TokenError};
use crate::services::{CatalogError, ShoppingListError, StoreError};

/// Application-level error type returned by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input; nothing was written.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The resource exists but belongs to another account.
    #[error("{0}")]
    NotOwner(String),

    /// No session, or credentials did not check out.
    #[error("{0}")]
    Unauthorized(String),

    /// Session token failed verification.
    #[error("invalid session")]
    InvalidToken,

    /// The caller's role does not reach the route's tier.
    #[error("{0}")]
    Forbidden(String),

    /// Storage, hashing or signing failure. The message is logged, not sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // Not-owner is reported as an authentication failure
            Self::NotOwner(_) | Self::Unauthorized(_) | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if matches!(self, Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            // Don't expose internal error details to clients
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate Sentry events for the rest of this request with an account.
pub fn set_sentry_user(account_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            ..Default::default()
        }));
    });
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::MissingReference(_) => {
                Self::Validation("referenced record does not exist".to_owned())
            }
            RepositoryError::Invalid(_) => Self::Validation("invalid value".to_owned()),
            RepositoryError::NoFieldsProvided => Self::Validation("no fields to update".to_owned()),
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort { .. } => Self::Validation(err.to_string()),
            PasswordError::Hashing => Self::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::InvalidToken,
            TokenError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) | AuthError::MissingName => {
                Self::Validation(err.to_string())
            }
            AuthError::Password(inner) => inner.into(),
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::AccountNotFound => Self::NotFound(err.to_string()),
            AuthError::Token(inner) => inner.into(),
            AuthError::Repository(inner) => inner.into(),
        }
    }
}

impl From<ShoppingListError> for AppError {
    fn from(err: ShoppingListError) -> Self {
        match err {
            ShoppingListError::MissingName
            | ShoppingListError::InvalidQuantity
            | ShoppingListError::UnknownProduct => Self::Validation(err.to_string()),
            ShoppingListError::ListNotFound
            | ShoppingListError::ItemNotFound
            | ShoppingListError::StoreNotFound => Self::NotFound(err.to_string()),
            ShoppingListError::NotOwner => Self::NotOwner(err.to_string()),
            ShoppingListError::Repository(inner) => inner.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingName
            | StoreError::MissingAddress
            | StoreError::InvalidTaxId(_)
            | StoreError::MissingAdminName
            | StoreError::InvalidAdminEmail(_) => Self::Validation(err.to_string()),
            StoreError::Password(inner) => inner.into(),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Repository(inner) => inner.into(),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingName
            | CatalogError::MissingSearchTerm
            | CatalogError::EmptyPatch
            | CatalogError::SelfParent
            | CatalogError::NegativePrice
            | CatalogError::NegativeQuantity
            | CatalogError::UnknownCategory => Self::Validation(err.to_string()),
            CatalogError::ProductNotFound
            | CatalogError::CategoryNotFound
            | CatalogError::StoreNotFound => Self::NotFound(err.to_string()),
            CatalogError::Conflict(msg) => Self::Conflict(msg),
            CatalogError::Repository(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(status_of(AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::NotOwner("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_errors_map_to_taxonomy() {
        assert_eq!(status_of(ShoppingListError::NotOwner), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ShoppingListError::ListNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AuthError::Password(PasswordError::TooShort { min: 8 })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::Password(PasswordError::Hashing)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(CatalogError::EmptyPatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(RepositoryError::MissingReference("fk".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::Repository(RepositoryError::Invalid(
                "stores_tax_id_check".into()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::Repository(RepositoryError::Database(
                sqlx::Error::PoolTimedOut
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("connection refused on 10.0.0.3".into()).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_client_errors_carry_message() {
        let response = AppError::from(StoreError::MissingAddress).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "store address is required");
    }
}
