//! Account roles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a role string is not part of the vocabulary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

/// The closed set of account roles, in increasing order of privilege.
///
/// `Customer` is what every signup gets. `StoreAdmin` is attached to exactly
/// one store and is created by store provisioning; `Admin` and `SuperAdmin`
/// are granted by the operator CLI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    StoreAdmin,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Customer, Self::StoreAdmin, Self::Admin, Self::SuperAdmin];

    /// Wire name, as stored in the database and carried in session tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::StoreAdmin => "store_admin",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Whether this role is tied to a single store.
    #[must_use]
    pub const fn requires_store(self) -> bool {
        matches!(self, Self::StoreAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_customer() {
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn test_parse_matches_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            "root".parse::<Role>(),
            Err(RoleParseError("root".to_owned()))
        );
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::StoreAdmin).unwrap(),
            "\"store_admin\""
        );
    }

    #[test]
    fn test_only_store_admin_requires_store() {
        let tied: Vec<_> = Role::ALL.into_iter().filter(|r| r.requires_store()).collect();
        assert_eq!(tied, vec![Role::StoreAdmin]);
    }
}
