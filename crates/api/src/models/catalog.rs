//! Product catalog, categories and per-store stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use localiza_core::{CategoryId, ProductId, StockItemId, StoreId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// Sparse product update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub parent_id: Option<CategoryId>,
}

/// A product offered by a store at a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockItem {
    pub id: StockItemId,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub price: Decimal,
    pub quantity: i32,
    pub sector: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub price: Decimal,
    pub quantity: i32,
    pub sector: Option<String>,
}

/// A store's stock entry joined with the product it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreProduct {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub sector: Option<String>,
}
