//! Products, categories and store stock.

use rust_decimal::Decimal;
use thiserror::Error;

use localiza_core::{CategoryId, ProductId, StoreId};

use crate::db::{CatalogRepository, PartialUpdate, RepositoryError, StoreRepository, UpdateTable};
use crate::models::{
    Category, CategoryPatch, NewCategory, NewProduct, NewStockItem, Product, ProductPatch,
    StockItem, StoreProduct,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("name is required")]
    MissingName,

    #[error("search term is required")]
    MissingSearchTerm,

    #[error("no fields to update")]
    EmptyPatch,

    #[error("a category cannot be its own parent")]
    SelfParent,

    #[error("price must not be negative")]
    NegativePrice,

    #[error("quantity must not be negative")]
    NegativeQuantity,

    #[error("category does not exist")]
    UnknownCategory,

    #[error("product not found")]
    ProductNotFound,

    #[error("category not found")]
    CategoryNotFound,

    #[error("store not found")]
    StoreNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Reject a present-but-blank name; absent is fine.
fn check_name(name: Option<&str>) -> Result<Option<String>, CatalogError> {
    match name.map(str::trim) {
        Some("") => Err(CatalogError::MissingName),
        other => Ok(other.map(str::to_owned)),
    }
}

/// Input for a new stock entry; the store and product come from the path.
#[derive(Debug, Clone)]
pub struct StockDraft {
    pub price: Decimal,
    pub quantity: i32,
    pub sector: Option<String>,
}

pub struct CatalogService<'a> {
    catalog: &'a dyn CatalogRepository,
    stores: &'a dyn StoreRepository,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogRepository, stores: &'a dyn StoreRepository) -> Self {
        Self { catalog, stores }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on storage failure.
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.catalog.list_products().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::MissingSearchTerm` for a blank term.
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, CatalogError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(CatalogError::MissingSearchTerm);
        }
        Ok(self.catalog.search_products(term).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::MissingName` or `CatalogError::UnknownCategory`.
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let name = check_name(Some(product.name.as_str()))?.ok_or(CatalogError::MissingName)?;
        let product = NewProduct { name, ..product };

        self.catalog
            .create_product(&product)
            .await
            .map_err(|e| match e {
                RepositoryError::MissingReference(_) => CatalogError::UnknownCategory,
                RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
                other => CatalogError::Repository(other),
            })
    }

    /// Apply only the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyPatch` when nothing is set,
    /// `CatalogError::ProductNotFound` for an unknown id, and
    /// `CatalogError::UnknownCategory` for a dangling category id.
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        let update = PartialUpdate::new(UpdateTable::Products, id)
            .set("name", check_name(patch.name.as_deref())?)
            .set("description", patch.description)
            .set("brand", patch.brand)
            .set("image_url", patch.image_url)
            .set("category_id", patch.category_id);

        self.catalog
            .apply_update(&update)
            .await
            .map_err(|e| match e {
                RepositoryError::NoFieldsProvided => CatalogError::EmptyPatch,
                RepositoryError::NotFound => CatalogError::ProductNotFound,
                RepositoryError::MissingReference(_) => CatalogError::UnknownCategory,
                RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
                other => CatalogError::Repository(other),
            })?;

        self.catalog
            .get_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for an unknown id.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.catalog.delete_product(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::ProductNotFound,
            other => CatalogError::Repository(other),
        })
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on storage failure.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.catalog.list_categories().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` for an unknown id.
    pub async fn category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.catalog
            .get_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::MissingName`, `CatalogError::UnknownCategory`
    /// for a missing parent, or `CatalogError::Conflict` for a duplicate name.
    pub async fn create_category(&self, category: NewCategory) -> Result<Category, CatalogError> {
        let name = check_name(Some(category.name.as_str()))?.ok_or(CatalogError::MissingName)?;

        if let Some(parent_id) = category.parent_id
            && self.catalog.get_category(parent_id).await?.is_none()
        {
            return Err(CatalogError::UnknownCategory);
        }

        self.catalog
            .create_category(&NewCategory {
                name,
                parent_id: category.parent_id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::MissingReference(_) => CatalogError::UnknownCategory,
                RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
                other => CatalogError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns `CatalogError::EmptyPatch`, `CatalogError::SelfParent`,
    /// `CatalogError::CategoryNotFound` or `CatalogError::UnknownCategory`.
    pub async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, CatalogError> {
        if patch.parent_id == Some(id) {
            return Err(CatalogError::SelfParent);
        }
        let update = PartialUpdate::new(UpdateTable::Categories, id)
            .set("name", check_name(patch.name.as_deref())?)
            .set("parent_id", patch.parent_id);

        self.catalog
            .apply_update(&update)
            .await
            .map_err(|e| match e {
                RepositoryError::NoFieldsProvided => CatalogError::EmptyPatch,
                RepositoryError::NotFound => CatalogError::CategoryNotFound,
                RepositoryError::MissingReference(_) => CatalogError::UnknownCategory,
                RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
                other => CatalogError::Repository(other),
            })?;

        self.category(id).await
    }

    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` for an unknown id.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.catalog.delete_category(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::CategoryNotFound,
            other => CatalogError::Repository(other),
        })
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Offer a product at a store.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `CatalogError::StoreNotFound`,
    /// `CatalogError::ProductNotFound`, or `CatalogError::Conflict` if the
    /// store already stocks the product.
    pub async fn add_stock(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        draft: StockDraft,
    ) -> Result<StockItem, CatalogError> {
        if draft.price < Decimal::ZERO {
            return Err(CatalogError::NegativePrice);
        }
        if draft.quantity < 0 {
            return Err(CatalogError::NegativeQuantity);
        }
        if self.stores.get_by_id(store_id).await?.is_none() {
            return Err(CatalogError::StoreNotFound);
        }
        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(CatalogError::ProductNotFound);
        }

        let item = NewStockItem {
            store_id,
            product_id,
            price: draft.price,
            quantity: draft.quantity,
            sector: draft
                .sector
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
        };
        self.catalog
            .create_stock_item(&item)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
                other => CatalogError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` for an unknown store.
    pub async fn store_products(&self, store_id: StoreId) -> Result<Vec<StoreProduct>, CatalogError> {
        if self.stores.get_by_id(store_id).await?.is_none() {
            return Err(CatalogError::StoreNotFound);
        }
        Ok(self.catalog.list_store_products(store_id).await?)
    }
}
