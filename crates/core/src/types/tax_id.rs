//! Store tax registration numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxIdError {
    #[error("tax id is required")]
    Empty,
    #[error("tax id must be exactly {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// A store's tax id (CNPJ), kept as the 14 characters the operator typed.
///
/// Only the length is checked; punctuation-free digits are expected but not
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    pub const LENGTH: usize = 14;

    /// # Errors
    ///
    /// Returns [`TaxIdError`] if the trimmed input is empty or is not exactly
    /// [`TaxId::LENGTH`] characters long.
    pub fn parse(input: &str) -> Result<Self, TaxIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TaxIdError::Empty);
        }
        let actual = trimmed.chars().count();
        if actual != Self::LENGTH {
            return Err(TaxIdError::WrongLength {
                expected: Self::LENGTH,
                actual,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaxId {
    type Error = TaxIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaxId> for String {
    fn from(tax_id: TaxId) -> Self {
        tax_id.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TaxId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TaxId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TaxId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_fourteen_characters() {
        let tax_id = TaxId::parse(" 12345678000190 ").unwrap();
        assert_eq!(tax_id.as_str(), "12345678000190");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(TaxId::parse(""), Err(TaxIdError::Empty));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(
            TaxId::parse("1234567800019"),
            Err(TaxIdError::WrongLength {
                expected: 14,
                actual: 13
            })
        );
        assert!(TaxId::parse("123456780001900").is_err());
    }
}
