//! Session resolver.
//!
//! Verifies the `token` cookie and places the resulting [`AuthContext`] in
//! the request extensions. The signature is the only proof consulted; the
//! account table is never read here.

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};

use super::cookies::find_session_token;
use crate::error::{AppError, set_sentry_user};
use crate::models::AuthContext;
use crate::state::AppState;

/// Reject with 401 unless the request carries a valid session token.
///
/// # Errors
///
/// `AppError::Unauthorized` when no token is present and
/// `AppError::InvalidToken` when verification fails.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = find_session_token(
        request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    )
    .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let ctx: AuthContext = state.tokens().verify(&token)?;

    tracing::Span::current().record("account_id", ctx.subject.as_i64());
    set_sentry_user(&ctx.subject);
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use localiza_core::{AccountId, Role};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;
    use crate::db::{Repositories, memory::MemoryStore};

    const SECRET: &str = "kR8#vQ2!mZ6@pL4$wN9%tB1^yH7&cJ3*";

    fn state() -> AppState {
        AppState::new(
            ApiConfig::for_tests(SECRET),
            Repositories::in_memory(&MemoryStore::new()),
        )
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|ctx: AuthContext| async move { ctx.subject.to_string() }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
            .with_state(state)
    }

    async fn call(app: Router, cookie: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_populates_context() {
        let state = state();
        let token = state.tokens().issue(AccountId::new(7), Role::Customer).unwrap();
        let (status, body) = call(app(state), Some(&format!("token={token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "7");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (status, _) = call(app(state()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(app(state()), Some("theme=dark")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_tokens_are_unauthorized() {
        let state = state();
        let expired = state
            .tokens()
            .issue_at(
                AccountId::new(7),
                Role::Admin,
                Utc::now() - Duration::hours(25),
            )
            .unwrap();
        let (status, _) = call(app(state.clone()), Some(&format!("token={expired}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(app(state), Some("token=not.a.jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
