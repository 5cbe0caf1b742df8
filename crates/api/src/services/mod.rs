//! Business logic services.
//!
//! Services borrow the repositories they need from [`crate::state::AppState`]
//! for the duration of one request and take the caller's
//! [`crate::models::AuthContext`] explicitly where access depends on it.

pub mod auth;
pub mod catalog;
pub mod shopping_lists;
pub mod stores;

pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogError, CatalogService};
pub use shopping_lists::{ShoppingListError, ShoppingListService};
pub use stores::{StoreError, StoreService};
