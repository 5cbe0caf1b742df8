//! Store repository and the unit of work used for store onboarding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use localiza_core::{StoreId, TaxId};

use super::accounts::insert_account;
use super::{RepositoryError, map_write_error};
use crate::models::{Account, NewAccount, NewStore, Store};

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Store>, RepositoryError>;

    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError>;

    /// Open a unit of work holding one connection until it is committed or
    /// dropped.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;
}

/// Writes that must land together.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every write made through it. This covers early returns, errors and
/// cancelled request futures alike.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_store(&mut self, store: &NewStore) -> Result<Store, RepositoryError>;

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    address: String,
    tax_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let tax_id = TaxId::parse(&row.tax_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tax id in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            address: row.address,
            tax_id,
            created_at: row.created_at,
        })
    }
}

pub(crate) async fn insert_store<'e, E>(executor: E, store: &NewStore) -> Result<Store, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, StoreRow>(
        r"
        INSERT INTO stores (name, address, tax_id)
        VALUES ($1, $2, $3)
        RETURNING id, name, address, tax_id, created_at
        ",
    )
    .bind(&store.name)
    .bind(&store.address)
    .bind(store.tax_id.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| map_write_error(e, "tax id already registered"))?;

    row.try_into()
}

/// Postgres-backed [`StoreRepository`].
pub struct PgStoreRepository {
    pool: PgPool,
}

impl PgStoreRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(
            "SELECT id, name, address, tax_id, created_at FROM stores ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Store::try_from)
        .collect()
    }

    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(
            "SELECT id, name, address, tax_id, created_at FROM stores WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Store::try_from)
        .transpose()
    }

    async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        insert_store(&self.pool, store).await
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// A unit of work over one Postgres transaction.
///
/// `sqlx::Transaction` issues `ROLLBACK` when dropped uncommitted, so no
/// explicit cleanup is needed on error paths.
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_store(&mut self, store: &NewStore) -> Result<Store, RepositoryError> {
        insert_store(&mut *self.tx, store).await
    }

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, RepositoryError> {
        insert_account(&mut *self.tx, account).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
