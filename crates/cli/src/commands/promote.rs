//! Role promotion.
//!
//! Signup only ever creates customers, so elevated roles are granted here.
//! Role and store are written together: `store_admin` always gets a store,
//! every other role has its store cleared.

use localiza_api::db::{AccountRepository, PgAccountRepository, RepositoryError, create_pool};
use localiza_api::config::database_url_from_env;
use localiza_api::models::Account;
use localiza_core::{Email, Role, StoreId};

use super::CliError;

/// Check that the store argument fits the role.
fn store_for(role: Role, store: Option<i64>) -> Result<Option<StoreId>, CliError> {
    match (role.requires_store(), store) {
        (true, Some(id)) => Ok(Some(StoreId::new(id))),
        (true, None) => Err(CliError::StoreRequired),
        (false, Some(_)) => Err(CliError::StoreNotAllowed(role)),
        (false, None) => Ok(None),
    }
}

/// Validate the arguments and apply the change through `accounts`.
pub async fn promote(
    accounts: &dyn AccountRepository,
    email: &str,
    role: &str,
    store: Option<i64>,
) -> Result<Account, CliError> {
    let email = Email::parse(email)?;
    let role: Role = role.parse()?;
    let store_id = store_for(role, store)?;

    accounts
        .update_role(&email, role, store_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::AccountNotFound(email.to_string()),
            RepositoryError::MissingReference(_) => {
                CliError::UnknownStore(store_id.map_or(0, |id| id.as_i64()))
            }
            other => CliError::Repository(other),
        })
}

/// Connect using the environment and promote one account.
///
/// # Errors
///
/// Returns `CliError` for bad arguments, an unknown account or store, or a
/// database failure.
pub async fn run(email: &str, role: &str, store: Option<i64>) -> Result<(), CliError> {
    let database_url = database_url_from_env()?;
    let pool = create_pool(&database_url).await?;
    let accounts = PgAccountRepository::new(pool);

    let account = promote(&accounts, email, role, store).await?;
    tracing::info!(
        account_id = %account.id,
        role = %account.role,
        store_id = ?account.store_id,
        "Account role updated"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use localiza_api::db::StoreRepository;
    use localiza_api::db::memory::MemoryStore;
    use localiza_api::models::{NewAccount, NewStore};
    use localiza_core::TaxId;

    use super::*;

    async fn seeded() -> (MemoryStore, StoreId) {
        let store = MemoryStore::new();
        AccountRepository::create(
            &store,
            &NewAccount::customer(
                "Bia".to_owned(),
                Email::parse("bia@example.com").unwrap(),
                None,
                "hash".to_owned(),
            ),
        )
        .await
        .unwrap();
        let shop = StoreRepository::create(
            &store,
            &NewStore {
                name: "Mercado Sol".to_owned(),
                address: "Rua A, 1".to_owned(),
                tax_id: TaxId::parse("12345678000190").unwrap(),
            },
        )
        .await
        .unwrap();
        (store, shop.id)
    }

    #[test]
    fn test_store_argument_must_match_role() {
        assert!(matches!(
            store_for(Role::StoreAdmin, None),
            Err(CliError::StoreRequired)
        ));
        assert!(matches!(
            store_for(Role::Admin, Some(1)),
            Err(CliError::StoreNotAllowed(Role::Admin))
        ));
        assert_eq!(store_for(Role::SuperAdmin, None).unwrap(), None);
        assert_eq!(
            store_for(Role::StoreAdmin, Some(4)).unwrap(),
            Some(StoreId::new(4))
        );
    }

    #[tokio::test]
    async fn test_promote_to_store_admin() {
        let (store, shop_id) = seeded().await;
        let account = promote(
            &store,
            "BIA@example.com",
            "store_admin",
            Some(shop_id.as_i64()),
        )
        .await
        .unwrap();
        assert_eq!(account.role, Role::StoreAdmin);
        assert_eq!(account.store_id, Some(shop_id));
    }

    #[tokio::test]
    async fn test_promote_rejects_bad_input() {
        let (store, _) = seeded().await;
        assert!(matches!(
            promote(&store, "bia@example.com", "owner", None).await,
            Err(CliError::InvalidRole(_))
        ));
        assert!(matches!(
            promote(&store, "nobody@example.com", "admin", None).await,
            Err(CliError::AccountNotFound(_))
        ));
    }
}
