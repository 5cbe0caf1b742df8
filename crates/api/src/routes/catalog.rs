//! Products, categories and store stock.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use localiza_core::{CategoryId, ProductId, StoreId};

use crate::error::Result;
use crate::models::{
    Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch, StockItem,
    StoreProduct,
};
use crate::services::CatalogService;
use crate::services::catalog::StockDraft;
use crate::state::AppState;

fn service(state: &AppState) -> CatalogService<'_> {
    CatalogService::new(state.repos().catalog.as_ref(), state.repos().stores.as_ref())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub sector: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(service(&state).products().await?))
}

/// GET /api/v1/products/search?search=
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(service(&state).search(&query.search).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = service(&state).create_product(product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /api/v1/products/{id}
///
/// Only the fields present in the body are written.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    Ok(Json(service(&state).update_product(id, patch).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    service(&state).delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(service(&state).categories().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(service(&state).category(id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(category): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = service(&state).create_category(category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<Category>> {
    Ok(Json(service(&state).update_category(id, patch).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    service(&state).delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Stock
// =============================================================================

/// GET /api/v1/stores/{store_id}/products
pub async fn store_products(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<StoreProduct>>> {
    Ok(Json(service(&state).store_products(store_id).await?))
}

/// POST /api/v1/stores/{store_id}/products/{product_id}
pub async fn add_stock(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(StoreId, ProductId)>,
    Json(req): Json<StockRequest>,
) -> Result<(StatusCode, Json<StockItem>)> {
    let item = service(&state)
        .add_stock(
            store_id,
            product_id,
            StockDraft {
                price: req.price,
                quantity: req.quantity,
                sector: req.sector,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}
