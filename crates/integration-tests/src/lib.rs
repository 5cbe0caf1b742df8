//! In-process test harness for the Localiza API.
//!
//! [`TestContext`] builds the real router over an in-memory backend and
//! drives it with `tower::ServiceExt::oneshot`. No database or open port is
//! involved.
//!
//! ```bash
//! cargo test -p localiza-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use localiza_api::config::ApiConfig;
use localiza_api::db::{AccountRepository, Repositories, memory::MemoryStore};
use localiza_api::models::{Account, NewAccount};
use localiza_api::routes;
use localiza_api::services::auth::{TokenCodec, password};
use localiza_api::state::AppState;
use localiza_core::{Email, Role, StoreId};

/// Token key shared by the router and by tests that forge tokens.
pub const TEST_SECRET: &str = "kR8#vQ2!mZ6@pL4$wN9%tB1^yH7&cJ3*";

/// Password given to every seeded account.
pub const TEST_PASSWORD: &str = "pw123456";

/// A response with its body already read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` pair of the `token` cookie set by this response.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("token="))
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

pub struct TestContext {
    pub store: MemoryStore,
    pub tokens: TokenCodec,
    app: Router,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let config = ApiConfig::for_tests(TEST_SECRET);
        let tokens = TokenCodec::new(&config.token_secret);
        let app = routes::router(AppState::new(config, Repositories::in_memory(&store)));
        Self { store, tokens, app }
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, cookie, None).await
    }

    pub async fn post(&self, path: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, path, cookie, Some(body)).await
    }

    pub async fn patch(&self, path: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PATCH, path, cookie, Some(body)).await
    }

    /// Log in through the API and return the cookie to send back.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/v1/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response.session_cookie().unwrap()
    }

    /// Insert an account directly, bypassing signup's customer-only rule.
    pub async fn seed_account(&self, email: &str, role: Role, store_id: Option<StoreId>) -> Account {
        let password_hash = password::hash(TEST_PASSWORD.to_owned()).await.unwrap();
        AccountRepository::create(
            &self.store,
            &NewAccount {
                name: "Seeded".to_owned(),
                email: Email::parse(email).unwrap(),
                phone: None,
                password_hash,
                role,
                store_id,
            },
        )
        .await
        .unwrap()
    }

    /// Seed an account and log it in.
    pub async fn session_for(&self, email: &str, role: Role, store_id: Option<StoreId>) -> String {
        self.seed_account(email, role, store_id).await;
        self.login(email, TEST_PASSWORD).await
    }
}
