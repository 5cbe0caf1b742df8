//! Signup, login, logout and the caller's own account.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::{clear_session_cookie, session_cookie};
use crate::models::{Account, AuthContext};
use crate::services::AuthService;
use crate::services::auth::Registration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/users
///
/// Any role or store id in the body is ignored.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Account>)> {
    let auth = AuthService::new(state.repos().accounts.as_ref(), state.tokens());
    let account = auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// POST /api/v1/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.repos().accounts.as_ref(), state.tokens());
    let session = auth.login(&req.email, &req.password).await?;

    let cookie = session_cookie(session.token, state.config().cookie_secure);
    Ok((
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(session.account),
    ))
}

/// GET /api/v1/logout
///
/// Always succeeds; there is no server-side session to destroy.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.config().cookie_secure);
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
    )
}

/// GET /api/v1/users/me
pub async fn me(State(state): State<AppState>, ctx: AuthContext) -> Result<Json<Account>> {
    let auth = AuthService::new(state.repos().accounts.as_ref(), state.tokens());
    Ok(Json(auth.current_account(&ctx).await?))
}
