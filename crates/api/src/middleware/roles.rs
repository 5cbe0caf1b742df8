//! Role gates.
//!
//! A gate admits a request only if the session resolver has already placed an
//! [`AuthContext`] whose role is in the gate's set. A request with no context
//! is refused, never waved through.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use localiza_core::Role;

use crate::error::AppError;
use crate::models::AuthContext;

/// A fixed set of admitted roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    allowed: &'static [Role],
}

impl RoleGate {
    /// Store administrators and platform admins.
    pub const ADMIN_TIER: Self = Self {
        allowed: &[Role::StoreAdmin, Role::Admin, Role::SuperAdmin],
    };

    /// Catalog and onboarding operations.
    pub const SUPER_ADMIN: Self = Self {
        allowed: &[Role::SuperAdmin],
    };

    #[must_use]
    pub fn admits(self, ctx: Option<&AuthContext>) -> bool {
        ctx.is_some_and(|ctx| self.allowed.contains(&ctx.role))
    }
}

/// Middleware body for `from_fn_with_state(RoleGate::..., enforce_role)`.
///
/// # Errors
///
/// `AppError::Forbidden` when the role is missing or not admitted.
pub async fn enforce_role(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = request.extensions().get::<AuthContext>();
    if !gate.admits(ctx) {
        tracing::warn!(
            account_id = ctx.map(|c| c.subject.as_i64()),
            role = ctx.map(|c| c.role.as_str()),
            path = %request.uri().path(),
            "Role gate refused request"
        );
        return Err(AppError::Forbidden("insufficient role".to_owned()));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use localiza_core::AccountId;
    use tower::ServiceExt;

    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext::new(AccountId::new(1), role)
    }

    #[test]
    fn test_role_gate_truth_table() {
        for role in Role::ALL {
            let admin_tier = RoleGate::ADMIN_TIER.admits(Some(&ctx(role)));
            let super_admin = RoleGate::SUPER_ADMIN.admits(Some(&ctx(role)));
            match role {
                Role::Customer => assert!(!admin_tier && !super_admin),
                Role::StoreAdmin | Role::Admin => assert!(admin_tier && !super_admin),
                Role::SuperAdmin => assert!(admin_tier && super_admin),
            }
        }
    }

    #[test]
    fn test_missing_context_is_refused() {
        assert!(!RoleGate::ADMIN_TIER.admits(None));
        assert!(!RoleGate::SUPER_ADMIN.admits(None));
    }

    #[tokio::test]
    async fn test_gate_without_session_layer_is_forbidden() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RoleGate::ADMIN_TIER,
                enforce_role,
            ));
        let response = app
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
