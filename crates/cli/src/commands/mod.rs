//! CLI command implementations.

pub mod migrate;
pub mod promote;

use thiserror::Error;

use localiza_api::config::ConfigError;
use localiza_api::db::RepositoryError;
use localiza_core::{EmailError, Role, RoleParseError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    InvalidRole(#[from] RoleParseError),

    #[error("role store_admin requires --store <id>")]
    StoreRequired,

    #[error("--store only applies to store_admin, not {0}")]
    StoreNotAllowed(Role),

    #[error("No account with email: {0}")]
    AccountNotFound(String),

    #[error("Store does not exist: {0}")]
    UnknownStore(i64),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}
