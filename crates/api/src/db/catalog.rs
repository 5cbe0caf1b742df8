//! Catalog repository: products, categories and per-store stock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use localiza_core::{CategoryId, ProductId, StockItemId, StoreId};

use super::{PartialUpdate, RepositoryError, map_write_error};
use crate::models::{
    Category, NewCategory, NewProduct, NewStockItem, Product, StockItem, StoreProduct,
};

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Case-insensitive substring match on the product name.
    async fn search_products(&self, term: &str) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this id.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;

    /// Apply a sparse update to a product or category row.
    async fn apply_update(&self, update: &PartialUpdate) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store already stocks the
    /// product and `RepositoryError::MissingReference` if either does not exist.
    async fn create_stock_item(&self, item: &NewStockItem) -> Result<StockItem, RepositoryError>;

    async fn list_store_products(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreProduct>, RepositoryError>;
}

/// Escape `LIKE` metacharacters so user input only matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    brand: Option<String>,
    image_url: Option<String>,
    category_id: Option<CategoryId>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            brand: row.brand,
            image_url: row.image_url,
            category_id: row.category_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    parent_id: Option<CategoryId>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StockRow {
    id: StockItemId,
    store_id: StoreId,
    product_id: ProductId,
    price: Decimal,
    quantity: i32,
    sector: Option<String>,
}

#[derive(sqlx::FromRow)]
struct StoreProductRow {
    product_id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    quantity: i32,
    sector: Option<String>,
}

/// Postgres-backed [`CatalogRepository`].
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, brand, image_url, category_id, created_at
            FROM products
            ORDER BY name, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_products(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(term));
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, brand, image_url, category_id, created_at
            FROM products
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY name, id
            ",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, brand, image_url, category_id, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, description, brand, image_url, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, brand, image_url, category_id, created_at
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.brand.as_deref())
        .bind(product.image_url.as_deref())
        .bind(product.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "product already exists"))?;

        Ok(row.into())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, parent_id FROM categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, parent_id FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, parent_id)
            VALUES ($1, $2)
            RETURNING id, name, parent_id
            ",
        )
        .bind(&category.name)
        .bind(category.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "category already exists"))?;

        Ok(row.into())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn apply_update(&self, update: &PartialUpdate) -> Result<(), RepositoryError> {
        update.execute(&self.pool).await
    }

    async fn create_stock_item(&self, item: &NewStockItem) -> Result<StockItem, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(
            r"
            INSERT INTO stock_items (store_id, product_id, price, quantity, sector)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, store_id, product_id, price, quantity, sector
            ",
        )
        .bind(item.store_id)
        .bind(item.product_id)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.sector.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "store already stocks this product"))?;

        Ok(StockItem {
            id: row.id,
            store_id: row.store_id,
            product_id: row.product_id,
            price: row.price,
            quantity: row.quantity,
            sector: row.sector,
        })
    }

    async fn list_store_products(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreProductRow>(
            r"
            SELECT p.id AS product_id, p.name, p.description, si.price, si.quantity, si.sector
            FROM stock_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.store_id = $1
            ORDER BY si.sector ASC NULLS LAST, p.name ASC
            ",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StoreProduct {
                product_id: r.product_id,
                name: r.name,
                description: r.description,
                price: r.price,
                quantity: r.quantity,
                sector: r.sector,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_escape_like_plain_text_unchanged() {
        assert_eq!(escape_like("arroz"), "arroz");
    }
}
