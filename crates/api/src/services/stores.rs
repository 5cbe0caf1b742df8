//! Stores and store onboarding.
//!
//! [`StoreService::provision`] creates a store together with its first
//! `store_admin` account inside one unit of work. Either both rows commit or
//! neither is visible: a duplicate admin email undoes the store insert too.

use thiserror::Error;

use localiza_core::{Email, EmailError, TaxId, TaxIdError};

use super::auth::password::{self, PasswordError};
use crate::db::{RepositoryError, StoreRepository, UnitOfWork};
use crate::models::{Account, NewAccount, NewStore, Store};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store name is required")]
    MissingName,

    #[error("store address is required")]
    MissingAddress,

    #[error("invalid tax id: {0}")]
    InvalidTaxId(#[from] TaxIdError),

    #[error("administrator name is required")]
    MissingAdminName,

    #[error("invalid administrator email: {0}")]
    InvalidAdminEmail(#[from] EmailError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Duplicate tax id or administrator email.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

fn conflict_or_storage(error: RepositoryError) -> StoreError {
    match error {
        RepositoryError::Conflict(msg) => StoreError::Conflict(msg),
        other => StoreError::Repository(other),
    }
}

/// Store fields as received from the client.
#[derive(Debug, Clone)]
pub struct StoreDraft {
    pub name: String,
    pub address: String,
    pub tax_id: String,
}

impl StoreDraft {
    /// # Errors
    ///
    /// Returns the first failing rule: name, address, then tax id.
    pub fn validate(&self) -> Result<NewStore, StoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::MissingName);
        }
        let address = self.address.trim();
        if address.is_empty() {
            return Err(StoreError::MissingAddress);
        }
        let tax_id = TaxId::parse(&self.tax_id)?;

        Ok(NewStore {
            name: name.to_owned(),
            address: address.to_owned(),
            tax_id,
        })
    }
}

/// The first administrator of a store being onboarded.
#[derive(Debug, Clone)]
pub struct AdminDraft {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

struct ValidAdmin {
    name: String,
    email: Email,
    password: String,
    phone: Option<String>,
}

impl AdminDraft {
    fn validate(self) -> Result<ValidAdmin, StoreError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(StoreError::MissingAdminName);
        }
        let email = Email::parse(&self.email)?;
        password::check_policy(&self.password)?;

        Ok(ValidAdmin {
            name,
            email,
            password: self.password,
            phone: self
                .phone
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
        })
    }
}

/// Result of a successful onboarding.
#[derive(Debug, Clone)]
pub struct ProvisionedStore {
    pub store: Store,
    pub admin: Account,
}

pub struct StoreService<'a> {
    stores: &'a dyn StoreRepository,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(stores: &'a dyn StoreRepository) -> Self {
        Self { stores }
    }

    /// # Errors
    ///
    /// Returns `StoreError::Repository` on storage failure.
    pub async fn list(&self) -> Result<Vec<Store>, StoreError> {
        Ok(self.stores.list_all().await?)
    }

    /// Create a store on its own, without an administrator.
    ///
    /// # Errors
    ///
    /// Returns a validation error or `StoreError::Conflict` for a duplicate
    /// tax id.
    pub async fn create(&self, draft: &StoreDraft) -> Result<Store, StoreError> {
        let new_store = draft.validate()?;
        let store = self
            .stores
            .create(&new_store)
            .await
            .map_err(conflict_or_storage)?;
        tracing::info!(store_id = %store.id, "Store created");
        Ok(store)
    }

    /// Create a store and its `store_admin` account atomically.
    ///
    /// All input is validated before the unit of work is opened. Any failure
    /// after that rolls back both inserts; so does dropping the returned
    /// future mid-flight.
    ///
    /// # Errors
    ///
    /// Returns a validation error (nothing written), `StoreError::Conflict`
    /// for a duplicate tax id or admin email, and `StoreError::Repository` /
    /// `StoreError::Password` for internal failures.
    pub async fn provision(
        &self,
        draft: &StoreDraft,
        admin: AdminDraft,
    ) -> Result<ProvisionedStore, StoreError> {
        let new_store = draft.validate()?;
        let admin = admin.validate()?;

        let mut uow = self.stores.begin().await?;
        match write_store_and_admin(uow.as_mut(), &new_store, admin).await {
            Ok(provisioned) => {
                uow.commit().await.map_err(conflict_or_storage)?;
                tracing::info!(
                    store_id = %provisioned.store.id,
                    admin_id = %provisioned.admin.id,
                    "Store provisioned"
                );
                Ok(provisioned)
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!(error = %rollback_err, "Store provisioning rollback failed");
                }
                tracing::warn!(error = %e, "Store provisioning rolled back");
                Err(e)
            }
        }
    }
}

async fn write_store_and_admin(
    uow: &mut dyn UnitOfWork,
    new_store: &NewStore,
    admin: ValidAdmin,
) -> Result<ProvisionedStore, StoreError> {
    let store = uow
        .insert_store(new_store)
        .await
        .map_err(conflict_or_storage)?;

    let password_hash = password::hash(admin.password).await?;
    let account = NewAccount::store_admin(admin.name, admin.email, admin.phone, password_hash, store.id);

    let admin = uow
        .insert_account(&account)
        .await
        .map_err(conflict_or_storage)?;

    Ok(ProvisionedStore { store, admin })
}
