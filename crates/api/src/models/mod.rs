//! Domain models for the API.
//!
//! These are validated types that flow between repositories, services and
//! handlers. Database row shapes live next to the queries in [`crate::db`].

pub mod account;
pub mod catalog;
pub mod session;
pub mod shopping_list;
pub mod store;

pub use account::{Account, NewAccount};
pub use catalog::{
    Category, CategoryPatch, NewCategory, NewProduct, NewStockItem, Product, ProductPatch,
    StockItem, StoreProduct,
};
pub use session::AuthContext;
pub use shopping_list::{
    ListItemDetail, NewListItem, PricedList, PricedListItem, ShoppingList, ShoppingListItem,
    ShoppingListSummary,
};
pub use store::{NewStore, Store};
