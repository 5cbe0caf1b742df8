//! Database migrations.
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time. The API server never migrates on startup.

use secrecy::ExposeSecret;
use sqlx::PgPool;

use localiza_api::config::database_url_from_env;

use super::CliError;

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CliError` if the URL is missing, the connection fails or a
/// migration fails.
pub async fn run() -> Result<(), CliError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
