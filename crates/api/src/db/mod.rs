//! Database access for the Localiza API.
//!
//! # Tables
//!
//! - `users` - Accounts (customers, store admins, platform admins)
//! - `stores` - Retail stores, each administered by `store_admin` accounts
//! - `shopping_lists` / `shopping_list_items` - Per-account lists
//! - `products` / `categories` - The shared catalog
//! - `stock_items` - What each store sells, at what price and in which sector
//!
//! Every table sits behind a repository trait so services can run against the
//! Postgres implementation in production and [`memory::MemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p localiza-cli -- migrate
//! ```

pub mod accounts;
pub mod catalog;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod partial_update;
pub mod shopping_lists;
pub mod stores;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::{AccountRepository, Credentials, PgAccountRepository};
pub use catalog::{CatalogRepository, PgCatalogRepository};
pub use partial_update::{FieldValue, PartialUpdate, UpdateTable};
pub use shopping_lists::{PgShoppingListRepository, ShoppingListRepository};
pub use stores::{PgStoreRepository, StoreRepository, UnitOfWork};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., an email already registered).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A CHECK constraint rejected the row.
    #[error("invalid value: {0}")]
    Invalid(String),

    /// A foreign key points at a row that does not exist.
    #[error("referenced record does not exist: {0}")]
    MissingReference(String),

    /// A partial update was requested with nothing to set.
    #[error("no fields provided")]
    NoFieldsProvided,
}

/// Translate constraint violations raised by a write into repository errors.
///
/// Only unique violations are conflicts; a failed CHECK is bad input.
pub(crate) fn map_write_error(error: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = error {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_check_violation() {
            let constraint = db_err.constraint().unwrap_or("check").to_owned();
            return RepositoryError::Invalid(constraint);
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("foreign key").to_owned();
            return RepositoryError::MissingReference(constraint);
        }
    }
    RepositoryError::Database(error)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// The full set of repositories a running server needs.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub shopping_lists: Arc<dyn ShoppingListRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            stores: Arc::new(PgStoreRepository::new(pool.clone())),
            shopping_lists: Arc::new(PgShoppingListRepository::new(pool.clone())),
            catalog: Arc::new(PgCatalogRepository::new(pool)),
        }
    }

    /// Repositories over a shared in-memory store.
    #[cfg(any(test, feature = "memory"))]
    #[must_use]
    pub fn in_memory(store: &memory::MemoryStore) -> Self {
        Self {
            accounts: Arc::new(store.clone()),
            stores: Arc::new(store.clone()),
            shopping_lists: Arc::new(store.clone()),
            catalog: Arc::new(store.clone()),
        }
    }
}
