//! Shopping list domain types.
//!
//! A list belongs to exactly one account and its items belong to the list.
//! Every read or write of list contents goes through
//! [`crate::services::shopping_lists::ShoppingListService::authorize`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use localiza_core::{AccountId, ProductId, ShoppingListId, ShoppingListItemId, StoreId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub id: ShoppingListId,
    pub owner_id: AccountId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A list as shown in the owner's overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListSummary {
    pub id: ShoppingListId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub item_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub id: ShoppingListItemId,
    pub list_id: ShoppingListId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub is_checked: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NewListItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// An item joined with its product, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItemDetail {
    pub id: ShoppingListItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub is_checked: bool,
}

/// An item annotated with one store's price and aisle.
///
/// `unit_price` and `sector` are `None` when the store does not stock the
/// product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedListItem {
    pub item_id: ShoppingListItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub description: String,
    pub quantity: i32,
    pub is_checked: bool,
    pub unit_price: Option<Decimal>,
    pub sector: Option<String>,
}

impl PricedListItem {
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.map(|price| price * Decimal::from(self.quantity))
    }
}

/// A list viewed through one store: each item with that store's price and
/// sector, plus what the stocked items add up to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedList {
    pub list_id: ShoppingListId,
    pub store_id: StoreId,
    pub items: Vec<PricedListItem>,
    /// Sum of `unit_price * quantity` over items the store stocks.
    pub estimated_total: Decimal,
    /// Items the store does not stock.
    pub unavailable: usize,
}

impl PricedList {
    #[must_use]
    pub fn new(list_id: ShoppingListId, store_id: StoreId, items: Vec<PricedListItem>) -> Self {
        let estimated_total = items.iter().filter_map(PricedListItem::line_total).sum();
        let unavailable = items.iter().filter(|i| i.unit_price.is_none()).count();
        Self {
            list_id,
            store_id,
            items,
            estimated_total,
            unavailable,
        }
    }
}
