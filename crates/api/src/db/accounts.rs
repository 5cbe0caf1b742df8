//! Account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use localiza_core::{AccountId, Email, Role, StoreId};

use super::{RepositoryError, map_write_error};
use crate::models::{Account, NewAccount};

/// An account together with its stored password hash, for login only.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account: Account,
    pub password_hash: String,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Round-trip to the backing store, for readiness checks.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError>;

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    async fn get_credentials(&self, email: &Email)
    -> Result<Option<Credentials>, RepositoryError>;

    /// Change an account's role and owning store together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    async fn update_role(
        &self,
        email: &Email,
        role: Role,
        store_id: Option<StoreId>,
    ) -> Result<Account, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    name: String,
    email: String,
    phone: Option<String>,
    role: Role,
    store_id: Option<StoreId>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            phone: row.phone,
            role: row.role,
            store_id: row.store_id,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

/// Insert an account using any executor (pool or open transaction).
pub(crate) async fn insert_account<'e, E>(
    executor: E,
    account: &NewAccount,
) -> Result<Account, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, AccountRow>(
        r"
        INSERT INTO users (name, email, phone, password_hash, role, store_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, email, phone, role, store_id, created_at
        ",
    )
    .bind(&account.name)
    .bind(account.email.as_str())
    .bind(account.phone.as_deref())
    .bind(&account.password_hash)
    .bind(account.role)
    .bind(account.store_id)
    .fetch_one(executor)
    .await
    .map_err(|e| map_write_error(e, "email already registered"))?;

    row.try_into()
}

/// Postgres-backed [`AccountRepository`].
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        insert_account(&self.pool, account).await
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, name, email, phone, role, store_id, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<Credentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r"
            SELECT id, name, email, phone, role, store_id, created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Credentials {
                account: r.account.try_into()?,
                password_hash: r.password_hash,
            })),
            None => Ok(None),
        }
    }

    async fn update_role(
        &self,
        email: &Email,
        role: Role,
        store_id: Option<StoreId>,
    ) -> Result<Account, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(
            r"
            UPDATE users
            SET role = $1, store_id = $2
            WHERE email = $3
            RETURNING id, name, email, phone, role, store_id, created_at
            ",
        )
        .bind(role)
        .bind(store_id)
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "role change rejected"))?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }
}
