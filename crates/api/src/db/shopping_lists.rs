//! Shopping list repository.
//!
//! None of these queries check ownership; callers go through the ownership
//! guard in [`crate::services::shopping_lists`] first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use localiza_core::{AccountId, ProductId, ShoppingListId, ShoppingListItemId, StoreId};

use super::{RepositoryError, map_write_error};
use crate::models::{
    ListItemDetail, NewListItem, PricedListItem, ShoppingList, ShoppingListItem,
    ShoppingListSummary,
};

#[async_trait]
pub trait ShoppingListRepository: Send + Sync {
    async fn create_list(
        &self,
        owner: AccountId,
        name: &str,
    ) -> Result<ShoppingList, RepositoryError>;

    async fn get_list(&self, id: ShoppingListId) -> Result<Option<ShoppingList>, RepositoryError>;

    async fn list_by_owner(
        &self,
        owner: AccountId,
    ) -> Result<Vec<ShoppingListSummary>, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the product does not exist.
    async fn create_item(
        &self,
        list_id: ShoppingListId,
        item: NewListItem,
    ) -> Result<ShoppingListItem, RepositoryError>;

    async fn list_items(
        &self,
        list_id: ShoppingListId,
    ) -> Result<Vec<ListItemDetail>, RepositoryError>;

    /// Set the checked flag of an item that belongs to `list_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist or
    /// belongs to another list.
    async fn set_item_checked(
        &self,
        list_id: ShoppingListId,
        item_id: ShoppingListItemId,
        checked: bool,
    ) -> Result<ShoppingListItem, RepositoryError>;

    /// Items of a list with one store's price and sector, in shelf order.
    async fn priced_items(
        &self,
        list_id: ShoppingListId,
        store_id: StoreId,
    ) -> Result<Vec<PricedListItem>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ShoppingListRow {
    id: ShoppingListId,
    owner_id: AccountId,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ShoppingListRow> for ShoppingList {
    fn from(row: ShoppingListRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: ShoppingListId,
    name: String,
    created_at: DateTime<Utc>,
    item_count: i64,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: ShoppingListItemId,
    list_id: ShoppingListId,
    product_id: ProductId,
    quantity: i32,
    is_checked: bool,
}

impl From<ItemRow> for ShoppingListItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            list_id: row.list_id,
            product_id: row.product_id,
            quantity: row.quantity,
            is_checked: row.is_checked,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: ShoppingListItemId,
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    is_checked: bool,
}

#[derive(sqlx::FromRow)]
struct PricedRow {
    item_id: ShoppingListItemId,
    product_id: ProductId,
    product_name: String,
    description: String,
    quantity: i32,
    is_checked: bool,
    unit_price: Option<Decimal>,
    sector: Option<String>,
}

/// Postgres-backed [`ShoppingListRepository`].
pub struct PgShoppingListRepository {
    pool: PgPool,
}

impl PgShoppingListRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShoppingListRepository for PgShoppingListRepository {
    async fn create_list(
        &self,
        owner: AccountId,
        name: &str,
    ) -> Result<ShoppingList, RepositoryError> {
        let row = sqlx::query_as::<_, ShoppingListRow>(
            r"
            INSERT INTO shopping_lists (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, owner_id, name, created_at
            ",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "shopping list already exists"))?;

        Ok(row.into())
    }

    async fn get_list(&self, id: ShoppingListId) -> Result<Option<ShoppingList>, RepositoryError> {
        let row = sqlx::query_as::<_, ShoppingListRow>(
            "SELECT id, owner_id, name, created_at FROM shopping_lists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(
        &self,
        owner: AccountId,
    ) -> Result<Vec<ShoppingListSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT sl.id, sl.name, sl.created_at, COUNT(sli.id) AS item_count
            FROM shopping_lists sl
            LEFT JOIN shopping_list_items sli ON sli.list_id = sl.id
            WHERE sl.owner_id = $1
            GROUP BY sl.id
            ORDER BY sl.created_at DESC, sl.id DESC
            ",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ShoppingListSummary {
                id: r.id,
                name: r.name,
                created_at: r.created_at,
                item_count: r.item_count,
            })
            .collect())
    }

    async fn create_item(
        &self,
        list_id: ShoppingListId,
        item: NewListItem,
    ) -> Result<ShoppingListItem, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO shopping_list_items (list_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, list_id, product_id, quantity, is_checked
            ",
        )
        .bind(list_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "item already on list"))?;

        Ok(row.into())
    }

    async fn list_items(
        &self,
        list_id: ShoppingListId,
    ) -> Result<Vec<ListItemDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, DetailRow>(
            r"
            SELECT sli.id, sli.product_id, p.name AS product_name, sli.quantity, sli.is_checked
            FROM shopping_list_items sli
            JOIN products p ON p.id = sli.product_id
            WHERE sli.list_id = $1
            ORDER BY sli.id
            ",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ListItemDetail {
                id: r.id,
                product_id: r.product_id,
                product_name: r.product_name,
                quantity: r.quantity,
                is_checked: r.is_checked,
            })
            .collect())
    }

    async fn set_item_checked(
        &self,
        list_id: ShoppingListId,
        item_id: ShoppingListItemId,
        checked: bool,
    ) -> Result<ShoppingListItem, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            UPDATE shopping_list_items
            SET is_checked = $1
            WHERE id = $2 AND list_id = $3
            RETURNING id, list_id, product_id, quantity, is_checked
            ",
        )
        .bind(checked)
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn priced_items(
        &self,
        list_id: ShoppingListId,
        store_id: StoreId,
    ) -> Result<Vec<PricedListItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, PricedRow>(
            r"
            SELECT sli.id AS item_id, sli.product_id, p.name AS product_name, p.description,
                   sli.quantity, sli.is_checked, si.price AS unit_price, si.sector
            FROM shopping_list_items sli
            JOIN products p ON p.id = sli.product_id
            LEFT JOIN stock_items si ON si.product_id = sli.product_id AND si.store_id = $2
            WHERE sli.list_id = $1
            ORDER BY si.sector ASC NULLS LAST, p.name ASC, sli.id ASC
            ",
        )
        .bind(list_id)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PricedListItem {
                item_id: r.item_id,
                product_id: r.product_id,
                product_name: r.product_name,
                description: r.description,
                quantity: r.quantity,
                is_checked: r.is_checked,
                unit_price: r.unit_price,
                sector: r.sector,
            })
            .collect())
    }
}
