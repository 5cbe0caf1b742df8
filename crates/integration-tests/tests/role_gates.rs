//! Role gates over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use localiza_api::db::StoreRepository;
use localiza_api::models::NewStore;
use localiza_core::{Role, StoreId, TaxId};
use localiza_integration_tests::TestContext;

async fn seed_store(ctx: &TestContext) -> StoreId {
    StoreRepository::create(
        &ctx.store,
        &NewStore {
            name: "Mercado Sol".to_owned(),
            address: "Rua A, 1".to_owned(),
            tax_id: TaxId::parse("12345678000190").unwrap(),
        },
    )
    .await
    .unwrap()
    .id
}

fn admin_tier_body(n: usize) -> Value {
    json!({
        "name": format!("Loja {n}"),
        "address": "Rua B, 2",
        "tax_id": format!("{:014}", 11_000_000_000_000_u64 + n as u64)
    })
}

fn super_admin_body(n: usize) -> Value {
    json!({ "name": format!("Categoria {n}") })
}

#[tokio::test]
async fn test_role_gate_truth_table() {
    let ctx = TestContext::new();
    let store_id = seed_store(&ctx).await;

    for (n, role) in Role::ALL.into_iter().enumerate() {
        let store = role.requires_store().then_some(store_id);
        let cookie = ctx
            .session_for(&format!("user{n}@x.com"), role, store)
            .await;

        let coarse = ctx
            .post("/api/v1/stores", Some(&cookie), admin_tier_body(n))
            .await
            .status;
        let strict = ctx
            .post("/api/v1/categories", Some(&cookie), super_admin_body(n))
            .await
            .status;

        let (coarse_expected, strict_expected) = match role {
            Role::Customer => (StatusCode::FORBIDDEN, StatusCode::FORBIDDEN),
            Role::StoreAdmin | Role::Admin => (StatusCode::CREATED, StatusCode::FORBIDDEN),
            Role::SuperAdmin => (StatusCode::CREATED, StatusCode::CREATED),
        };
        assert_eq!(coarse, coarse_expected, "admin tier gate for {role}");
        assert_eq!(strict, strict_expected, "super admin gate for {role}");
    }
}

#[tokio::test]
async fn test_gated_routes_need_a_session_first() {
    let ctx = TestContext::new();

    let coarse = ctx.post("/api/v1/stores", None, admin_tier_body(0)).await;
    assert_eq!(coarse.status, StatusCode::UNAUTHORIZED);

    let strict = ctx.post("/api/v1/categories", None, super_admin_body(0)).await;
    assert_eq!(strict.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_and_gated_methods_share_paths() {
    let ctx = TestContext::new();
    let customer = ctx.session_for("c@x.com", Role::Customer, None).await;

    // GET stays public while POST on the same path is gated
    assert_eq!(ctx.get("/api/v1/products", None).await.status, StatusCode::OK);
    assert_eq!(ctx.get("/api/v1/categories", None).await.status, StatusCode::OK);
    assert_eq!(
        ctx.post(
            "/api/v1/products",
            Some(&customer),
            json!({ "name": "Arroz" })
        )
        .await
        .status,
        StatusCode::FORBIDDEN
    );

    // GET /stores needs only a session; POST /stores needs the admin tier
    assert_eq!(ctx.get("/api/v1/stores", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        ctx.get("/api/v1/stores", Some(&customer)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_role_comes_from_the_token() {
    let ctx = TestContext::new();
    let account = ctx.seed_account("c@x.com", Role::Customer, None).await;

    // Trusted for the token's lifetime without consulting the account table
    let token = ctx.tokens.issue(account.id, Role::SuperAdmin).unwrap();
    let response = ctx
        .post(
            "/api/v1/categories",
            Some(&format!("token={token}")),
            super_admin_body(1),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}
