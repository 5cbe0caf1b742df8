//! Account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use localiza_core::{AccountId, Email, Role, StoreId};

/// A registered account.
///
/// The password hash is deliberately not part of this type; it is only ever
/// read through [`crate::db::AccountRepository::get_credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: Role,
    /// Set only for `store_admin` accounts.
    pub store_id: Option<StoreId>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert an account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub store_id: Option<StoreId>,
}

impl NewAccount {
    /// A self-service signup: always a customer, never tied to a store.
    #[must_use]
    pub const fn customer(
        name: String,
        email: Email,
        phone: Option<String>,
        password_hash: String,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            password_hash,
            role: Role::Customer,
            store_id: None,
        }
    }

    /// The first administrator of a freshly provisioned store.
    #[must_use]
    pub const fn store_admin(
        name: String,
        email: Email,
        phone: Option<String>,
        password_hash: String,
        store_id: StoreId,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            password_hash,
            role: Role::StoreAdmin,
            store_id: Some(store_id),
        }
    }
}
