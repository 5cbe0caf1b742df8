//! Sparse single-row updates for PATCH endpoints.
//!
//! A [`PartialUpdate`] names a table, the id of the row, and the columns that
//! were actually provided. Column names are `&'static str` chosen by the
//! caller at compile time; every value is bound as a query parameter.
//!
//! ```
//! use localiza_api::db::{PartialUpdate, UpdateTable};
//!
//! let update = PartialUpdate::new(UpdateTable::Products, 7)
//!     .set("name", Some("Arroz 5kg".to_owned()))
//!     .set("brand", None::<String>);
//!
//! let query = update.to_query().unwrap();
//! assert_eq!(query.sql(), "UPDATE products SET name = $1 WHERE id = $2");
//! ```

use rust_decimal::Decimal;
use sqlx::{PgExecutor, Postgres, QueryBuilder};

use localiza_core::{CategoryId, ProductId};

use super::{RepositoryError, map_write_error};

/// Tables that accept partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTable {
    Products,
    Categories,
}

impl UpdateTable {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
        }
    }
}

/// A value to assign to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    BigInt(i64),
    Int(i32),
    Bool(bool),
    Decimal(Decimal),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::BigInt(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<CategoryId> for FieldValue {
    fn from(value: CategoryId) -> Self {
        Self::BigInt(value.as_i64())
    }
}

impl From<ProductId> for FieldValue {
    fn from(value: ProductId) -> Self {
        Self::BigInt(value.as_i64())
    }
}

/// An `UPDATE ... SET ... WHERE id = ?` touching only the provided columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialUpdate {
    table: UpdateTable,
    id: i64,
    assignments: Vec<(&'static str, FieldValue)>,
}

impl PartialUpdate {
    #[must_use]
    pub fn new(table: UpdateTable, id: impl Into<i64>) -> Self {
        Self {
            table,
            id: id.into(),
            assignments: Vec::new(),
        }
    }

    /// Assign `column` if `value` is present; `None` leaves it untouched.
    #[must_use]
    pub fn set<V: Into<FieldValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.assignments.push((column, value.into()));
        }
        self
    }

    #[must_use]
    pub const fn table(&self) -> UpdateTable {
        self.table
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn assignments(&self) -> &[(&'static str, FieldValue)] {
        &self.assignments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Build the parameterized statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NoFieldsProvided` if nothing was set.
    pub fn to_query(&self) -> Result<QueryBuilder<'static, Postgres>, RepositoryError> {
        if self.is_empty() {
            return Err(RepositoryError::NoFieldsProvided);
        }

        let mut query = QueryBuilder::new("UPDATE ");
        query.push(self.table.as_str()).push(" SET ");

        let mut columns = query.separated(", ");
        for (column, value) in &self.assignments {
            columns.push(*column).push_unseparated(" = ");
            match value {
                FieldValue::Text(v) => columns.push_bind_unseparated(v.clone()),
                FieldValue::BigInt(v) => columns.push_bind_unseparated(*v),
                FieldValue::Int(v) => columns.push_bind_unseparated(*v),
                FieldValue::Bool(v) => columns.push_bind_unseparated(*v),
                FieldValue::Decimal(v) => columns.push_bind_unseparated(*v),
            };
        }

        query.push(" WHERE id = ").push_bind(self.id);
        Ok(query)
    }

    /// Run the update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NoFieldsProvided` if nothing was set,
    /// `RepositoryError::NotFound` if no row has this id, and
    /// `RepositoryError::Conflict` / `MissingReference` for constraint
    /// violations.
    pub async fn execute<'e, E>(&self, executor: E) -> Result<(), RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let mut query = self.to_query()?;
        let result = query
            .build()
            .execute(executor)
            .await
            .map_err(|e| map_write_error(e, "value already in use"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
