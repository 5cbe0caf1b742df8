//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use localiza_core::{StoreId, TaxId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub tax_id: TaxId,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a store insert.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub address: String,
    pub tax_id: TaxId,
}
