//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                       - Liveness
//! GET    /health/ready                                 - Database reachable
//!
//! # Public (/api/v1)
//! POST   /users                                        - Sign up (always a customer)
//! POST   /login                                        - Set the `token` cookie
//! GET    /logout                                       - Clear the `token` cookie
//! GET    /products                                     - List products
//! GET    /products/search?search=                      - Name search
//! GET    /categories                                   - List categories
//!
//! # Session required
//! GET    /users/me                                     - Caller's account
//! GET    /stores                                       - List stores
//! POST   /shopping-lists                               - Create a list
//! GET    /shopping-lists                               - Caller's lists
//! POST   /shopping-lists/{list_id}/items               - Add an item (owner only)
//! GET    /shopping-lists/{list_id}/items               - List items (owner only)
//! PATCH  /shopping-lists/{list_id}/items/{item_id}     - Check/uncheck (owner only)
//! GET    /shopping-lists/{list_id}/optimize?store_id=  - Priced by store (owner only)
//!
//! # Admin tier (store_admin, admin, super_admin)
//! POST   /stores                                       - Create a store
//! GET    /stores/{store_id}/products                   - Store's stock
//! POST   /stores/{store_id}/products/{product_id}      - Stock a product
//!
//! # Super admin
//! POST   /stores/onboard                               - Store + admin, atomically
//! POST   /products                                     - Create a product
//! PATCH  /products/{id}                                - Partial update
//! DELETE /products/{id}
//! POST   /categories                                   - Create a category
//! GET    /categories/{id}
//! PATCH  /categories/{id}                              - Partial update
//! DELETE /categories/{id}
//! ```

pub mod catalog;
pub mod health;
pub mod shopping_lists;
pub mod stores;
pub mod users;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{
    RoleGate, enforce_role, request_id_middleware, resolve_session, security_headers_middleware,
};
use crate::state::AppState;

/// Build the complete application: routes plus the middleware stack.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(session_routes(&state))
        .merge(admin_routes(&state))
        .merge(super_admin_routes(&state));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(state.config().request_timeout))
        .layer(cors_layer(&state))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        account_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(&state.config().cors_origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::signup))
        .route("/login", post(users::login))
        .route("/logout", get(users::logout))
        .route("/products", get(catalog::list_products))
        .route("/products/search", get(catalog::search_products))
        .route("/categories", get(catalog::list_categories))
}

fn session_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users/me", get(users::me))
        .route("/stores", get(stores::list))
        .route(
            "/shopping-lists",
            get(shopping_lists::list).post(shopping_lists::create),
        )
        .route(
            "/shopping-lists/{list_id}/items",
            get(shopping_lists::items).post(shopping_lists::add_item),
        )
        .route(
            "/shopping-lists/{list_id}/items/{item_id}",
            patch(shopping_lists::set_item_checked),
        )
        .route(
            "/shopping-lists/{list_id}/optimize",
            get(shopping_lists::optimize),
        )
        .route_layer(from_fn_with_state(state.clone(), resolve_session))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/stores", post(stores::create))
        .route("/stores/{store_id}/products", get(catalog::store_products))
        .route(
            "/stores/{store_id}/products/{product_id}",
            post(catalog::add_stock),
        )
        .route_layer(from_fn_with_state(RoleGate::ADMIN_TIER, enforce_role))
        .route_layer(from_fn_with_state(state.clone(), resolve_session))
}

fn super_admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/stores/onboard", post(stores::onboard))
        .route("/products", post(catalog::create_product))
        .route(
            "/products/{id}",
            patch(catalog::update_product).delete(catalog::delete_product),
        )
        .route("/categories", post(catalog::create_category))
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .patch(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route_layer(from_fn_with_state(RoleGate::SUPER_ADMIN, enforce_role))
        .route_layer(from_fn_with_state(state.clone(), resolve_session))
}
