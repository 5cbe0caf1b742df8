//! Request-scoped authentication context.
//!
//! The session resolver middleware places an [`AuthContext`] into the request
//! extensions after verifying the `token` cookie. Handlers take it as an
//! extractor and pass it explicitly to the services that need it.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

use localiza_core::{AccountId, Role};

use crate::error::AppError;

/// Who is calling, as proven by a verified session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub subject: AccountId,
    pub role: Role,
}

impl AuthContext {
    #[must_use]
    pub const fn new(subject: AccountId, role: Role) -> Self {
        Self { subject, role }
    }
}

/// Extractor for routes behind the session resolver.
///
/// Rejects with 401 if no context was resolved, e.g. when a handler is
/// mounted without the session layer.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }
}
