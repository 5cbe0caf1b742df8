//! Store onboarding: the store and its administrator are written together
//! or not at all.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use localiza_core::Role;
use localiza_integration_tests::TestContext;

fn onboard_body(tax_id: &str, admin_email: &str) -> Value {
    json!({
        "store_name": "Mercado Sol",
        "store_address": "Rua A, 1",
        "cnpj": tax_id,
        "admin": {
            "name": "Gerente",
            "email": admin_email,
            "password": "gerente123",
            "phone": "+55 11 99999-0000"
        }
    })
}

#[tokio::test]
async fn test_onboard_creates_linked_store_and_admin() {
    let ctx = TestContext::new();
    let cookie = ctx.session_for("root@x.com", Role::SuperAdmin, None).await;

    let response = ctx
        .post(
            "/api/v1/stores/onboard",
            Some(&cookie),
            onboard_body("12345678000190", "gerente@sol.com"),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let store_id = response.body["store"]["id"].as_i64().unwrap();
    assert_eq!(response.body["store"]["tax_id"], "12345678000190");
    assert_eq!(response.body["admin"]["role"], "store_admin");
    assert_eq!(response.body["admin"]["store_id"].as_i64(), Some(store_id));

    assert_eq!(ctx.store.store_count().await, 1);
    let admins = ctx.store.accounts_with_role(Role::StoreAdmin).await;
    assert_eq!(admins.len(), 1);

    // The new administrator can log in and reach admin-tier routes
    let admin_cookie = ctx.login("gerente@sol.com", "gerente123").await;
    let stock = ctx
        .get(&format!("/api/v1/stores/{store_id}/products"), Some(&admin_cookie))
        .await;
    assert_eq!(stock.status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_admin_email_leaves_no_store() {
    let ctx = TestContext::new();
    let cookie = ctx.session_for("root@x.com", Role::SuperAdmin, None).await;
    ctx.seed_account("taken@x.com", Role::Customer, None).await;
    let accounts_before = ctx.store.account_count().await;

    let response = ctx
        .post(
            "/api/v1/stores/onboard",
            Some(&cookie),
            onboard_body("12345678000190", "taken@x.com"),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    assert_eq!(ctx.store.store_count().await, 0);
    assert_eq!(ctx.store.account_count().await, accounts_before);
    let stores = ctx.get("/api/v1/stores", Some(&cookie)).await;
    assert_eq!(stores.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_storage_failure_leaves_no_account() {
    let ctx = TestContext::new();
    let cookie = ctx.session_for("root@x.com", Role::SuperAdmin, None).await;
    let accounts_before = ctx.store.account_count().await;
    ctx.store.fail_store_inserts(true).await;

    let response = ctx
        .post(
            "/api/v1/stores/onboard",
            Some(&cookie),
            onboard_body("12345678000190", "gerente@sol.com"),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error(), "Internal server error");

    assert_eq!(ctx.store.store_count().await, 0);
    assert_eq!(ctx.store.account_count().await, accounts_before);
    assert!(ctx.store.accounts_with_role(Role::StoreAdmin).await.is_empty());
}

#[tokio::test]
async fn test_invalid_input_writes_nothing() {
    let ctx = TestContext::new();
    let cookie = ctx.session_for("root@x.com", Role::SuperAdmin, None).await;
    let accounts_before = ctx.store.account_count().await;

    for tax_id in ["", "1234567800019", "123456780001900"] {
        let response = ctx
            .post(
                "/api/v1/stores/onboard",
                Some(&cookie),
                onboard_body(tax_id, "gerente@sol.com"),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "tax id {tax_id:?}");
    }

    let mut blank_name = onboard_body("12345678000190", "gerente@sol.com");
    blank_name["store_name"] = json!("  ");
    let response = ctx
        .post("/api/v1/stores/onboard", Some(&cookie), blank_name)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(ctx.store.store_count().await, 0);
    assert_eq!(ctx.store.account_count().await, accounts_before);
}

#[tokio::test]
async fn test_onboarding_requires_super_admin() {
    let ctx = TestContext::new();
    let cookie = ctx.session_for("ops@x.com", Role::Admin, None).await;

    let response = ctx
        .post(
            "/api/v1/stores/onboard",
            Some(&cookie),
            onboard_body("12345678000190", "gerente@sol.com"),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.store_count().await, 0);
}
