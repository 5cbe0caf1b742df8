//! Shopping lists and the ownership guard.
//!
//! Every operation on a list's contents first calls
//! [`ShoppingListService::authorize`], which loads the list and compares its
//! owner with the session subject. Roles play no part: an `admin` gets the
//! same rejection as a `customer` on someone else's list.
//!
//! The guard's read and the following write are separate statements. A list
//! deleted in between surfaces as `NotFound` on the write.

use thiserror::Error;

use localiza_core::{ShoppingListId, ShoppingListItemId, StoreId};

use crate::db::{RepositoryError, ShoppingListRepository, StoreRepository};
use crate::models::{
    AuthContext, ListItemDetail, NewListItem, PricedList, ShoppingList, ShoppingListItem,
    ShoppingListSummary,
};

#[derive(Debug, Error)]
pub enum ShoppingListError {
    #[error("list name is required")]
    MissingName,

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("shopping list not found")]
    ListNotFound,

    #[error("shopping list belongs to another account")]
    NotOwner,

    #[error("item not found on this list")]
    ItemNotFound,

    #[error("store not found")]
    StoreNotFound,

    #[error("product does not exist")]
    UnknownProduct,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct ShoppingListService<'a> {
    lists: &'a dyn ShoppingListRepository,
    stores: &'a dyn StoreRepository,
}

impl<'a> ShoppingListService<'a> {
    #[must_use]
    pub const fn new(
        lists: &'a dyn ShoppingListRepository,
        stores: &'a dyn StoreRepository,
    ) -> Self {
        Self { lists, stores }
    }

    /// Load a list on behalf of `ctx`, failing unless `ctx` owns it.
    ///
    /// Existence is checked before ownership, so a missing list is
    /// `ListNotFound` for everyone.
    ///
    /// # Errors
    ///
    /// Returns `ShoppingListError::ListNotFound` or `ShoppingListError::NotOwner`.
    pub async fn authorize(
        &self,
        ctx: &AuthContext,
        list_id: ShoppingListId,
    ) -> Result<ShoppingList, ShoppingListError> {
        let list = self
            .lists
            .get_list(list_id)
            .await?
            .ok_or(ShoppingListError::ListNotFound)?;

        if list.owner_id != ctx.subject {
            tracing::warn!(
                list_id = %list_id,
                subject = %ctx.subject,
                role = %ctx.role,
                "Rejected access to another account's shopping list"
            );
            return Err(ShoppingListError::NotOwner);
        }
        Ok(list)
    }

    /// # Errors
    ///
    /// Returns `ShoppingListError::MissingName` for a blank name.
    pub async fn create_list(
        &self,
        ctx: &AuthContext,
        name: &str,
    ) -> Result<ShoppingList, ShoppingListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShoppingListError::MissingName);
        }
        Ok(self.lists.create_list(ctx.subject, name).await?)
    }

    /// The caller's own lists; never anyone else's.
    ///
    /// # Errors
    ///
    /// Returns `ShoppingListError::Repository` on storage failure.
    pub async fn lists_for(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<ShoppingListSummary>, ShoppingListError> {
        Ok(self.lists.list_by_owner(ctx.subject).await?)
    }

    /// # Errors
    ///
    /// Returns the guard's errors, `ShoppingListError::InvalidQuantity` and
    /// `ShoppingListError::UnknownProduct`.
    pub async fn add_item(
        &self,
        ctx: &AuthContext,
        list_id: ShoppingListId,
        item: NewListItem,
    ) -> Result<ShoppingListItem, ShoppingListError> {
        if item.quantity <= 0 {
            return Err(ShoppingListError::InvalidQuantity);
        }
        let list = self.authorize(ctx, list_id).await?;

        self.lists
            .create_item(list.id, item)
            .await
            .map_err(|e| match e {
                RepositoryError::MissingReference(_) => ShoppingListError::UnknownProduct,
                other => ShoppingListError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns the guard's errors.
    pub async fn items(
        &self,
        ctx: &AuthContext,
        list_id: ShoppingListId,
    ) -> Result<Vec<ListItemDetail>, ShoppingListError> {
        let list = self.authorize(ctx, list_id).await?;
        Ok(self.lists.list_items(list.id).await?)
    }

    /// # Errors
    ///
    /// Returns the guard's errors and `ShoppingListError::ItemNotFound` if the
    /// item is not on this list.
    pub async fn set_item_checked(
        &self,
        ctx: &AuthContext,
        list_id: ShoppingListId,
        item_id: ShoppingListItemId,
        checked: bool,
    ) -> Result<ShoppingListItem, ShoppingListError> {
        let list = self.authorize(ctx, list_id).await?;
        self.lists
            .set_item_checked(list.id, item_id, checked)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ShoppingListError::ItemNotFound,
                other => ShoppingListError::Repository(other),
            })
    }

    /// The list annotated with one store's prices and sectors.
    ///
    /// # Errors
    ///
    /// Returns the guard's errors and `ShoppingListError::StoreNotFound`.
    pub async fn priced_view(
        &self,
        ctx: &AuthContext,
        list_id: ShoppingListId,
        store_id: StoreId,
    ) -> Result<PricedList, ShoppingListError> {
        let list = self.authorize(ctx, list_id).await?;
        if self.stores.get_by_id(store_id).await?.is_none() {
            return Err(ShoppingListError::StoreNotFound);
        }
        let items = self.lists.priced_items(list.id, store_id).await?;
        Ok(PricedList::new(list.id, store_id, items))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use localiza_core::{AccountId, Email, Role, TaxId};

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{AccountRepository, CatalogRepository};
    use crate::models::{NewAccount, NewProduct, NewStockItem, NewStore, Product};

    async fn account(store: &MemoryStore, email: &str, role: Role) -> AuthContext {
        let store_id = if role.requires_store() {
            let shop = StoreRepository::create(
                store,
                &NewStore {
                    name: "Mercado Lua".to_owned(),
                    address: "Rua B, 2".to_owned(),
                    tax_id: TaxId::parse("98765432000110").unwrap(),
                },
            )
            .await
            .unwrap();
            Some(shop.id)
        } else {
            None
        };
        let created = AccountRepository::create(
            store,
            &NewAccount {
                name: "Test".to_owned(),
                email: Email::parse(email).unwrap(),
                phone: None,
                password_hash: "unused".to_owned(),
                role,
                store_id,
            },
        )
        .await
        .unwrap();
        AuthContext::new(created.id, role)
    }

    async fn product(store: &MemoryStore, name: &str) -> Product {
        store
            .create_product(&NewProduct {
                name: name.to_owned(),
                description: String::new(),
                brand: None,
                image_url: None,
                category_id: None,
            })
            .await
            .unwrap()
    }

    fn item(product: &Product, quantity: i32) -> NewListItem {
        NewListItem {
            product_id: product.id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_owner_can_use_their_list() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let owner = account(&store, "a@x.com", Role::Customer).await;
        let rice = product(&store, "Arroz").await;

        let list = service.create_list(&owner, "Semana").await.unwrap();
        let added = service.add_item(&owner, list.id, item(&rice, 2)).await.unwrap();
        let checked = service
            .set_item_checked(&owner, list.id, added.id, true)
            .await
            .unwrap();

        assert!(checked.is_checked);
        let items = service.items(&owner, list.id).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_list_is_rejected_for_every_role() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let owner = account(&store, "owner@x.com", Role::Customer).await;
        let rice = product(&store, "Arroz").await;
        let list = service.create_list(&owner, "Semana").await.unwrap();
        let added = service.add_item(&owner, list.id, item(&rice, 1)).await.unwrap();

        let mut emails = ["c@x.com", "sa@x.com", "ad@x.com", "su@x.com"].into_iter();
        for role in Role::ALL {
            let intruder = account(&store, emails.next().unwrap(), role).await;
            assert!(matches!(
                service.authorize(&intruder, list.id).await,
                Err(ShoppingListError::NotOwner)
            ));
            assert!(matches!(
                service.add_item(&intruder, list.id, item(&rice, 1)).await,
                Err(ShoppingListError::NotOwner)
            ));
            assert!(matches!(
                service.items(&intruder, list.id).await,
                Err(ShoppingListError::NotOwner)
            ));
            assert!(matches!(
                service.set_item_checked(&intruder, list.id, added.id, true).await,
                Err(ShoppingListError::NotOwner)
            ));
        }
        assert_eq!(service.items(&owner, list.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_list_is_not_found_before_ownership() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let someone = account(&store, "a@x.com", Role::Admin).await;

        assert!(matches!(
            service.authorize(&someone, ShoppingListId::new(404)).await,
            Err(ShoppingListError::ListNotFound)
        ));
    }

    #[tokio::test]
    async fn test_toggle_is_scoped_to_the_list() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let owner = account(&store, "a@x.com", Role::Customer).await;
        let other = account(&store, "b@x.com", Role::Customer).await;
        let rice = product(&store, "Arroz").await;

        let mine = service.create_list(&owner, "Minha").await.unwrap();
        let theirs = service.create_list(&other, "Deles").await.unwrap();
        let their_item = service.add_item(&other, theirs.id, item(&rice, 1)).await.unwrap();

        // Owner of `mine` names an item that lives on `theirs`
        assert!(matches!(
            service
                .set_item_checked(&owner, mine.id, their_item.id, true)
                .await,
            Err(ShoppingListError::ItemNotFound)
        ));
        let untouched = service.items(&other, theirs.id).await.unwrap();
        assert!(!untouched.first().unwrap().is_checked);
    }

    #[tokio::test]
    async fn test_add_item_validation() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let owner = account(&store, "a@x.com", Role::Customer).await;
        let list = service.create_list(&owner, "Semana").await.unwrap();

        assert!(matches!(
            service
                .add_item(
                    &owner,
                    list.id,
                    NewListItem {
                        product_id: localiza_core::ProductId::new(999),
                        quantity: 1
                    }
                )
                .await,
            Err(ShoppingListError::UnknownProduct)
        ));
        let rice = product(&store, "Arroz").await;
        assert!(matches!(
            service.add_item(&owner, list.id, item(&rice, 0)).await,
            Err(ShoppingListError::InvalidQuantity)
        ));
        assert!(matches!(
            service.create_list(&owner, "   ").await,
            Err(ShoppingListError::MissingName)
        ));
    }

    #[tokio::test]
    async fn test_lists_for_only_returns_own_lists() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let ana = account(&store, "a@x.com", Role::Customer).await;
        let bia = account(&store, "b@x.com", Role::Customer).await;
        service.create_list(&ana, "Ana 1").await.unwrap();
        service.create_list(&bia, "Bia 1").await.unwrap();

        let lists = service.lists_for(&ana).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists.first().unwrap().name, "Ana 1");
        assert_eq!(
            service.lists_for(&AuthContext::new(AccountId::new(999), Role::Customer))
                .await
                .unwrap()
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn test_priced_view_orders_by_sector_and_totals() {
        let store = MemoryStore::new();
        let service = ShoppingListService::new(&store, &store);
        let owner = account(&store, "a@x.com", Role::Customer).await;
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

        let milk = product(&store, "Leite").await;
        let rice = product(&store, "Arroz").await;
        let caviar = product(&store, "Caviar").await;
        for (p, price, sector) in [(&milk, "4.50", "Laticínios"), (&rice, "22.90", "Grãos")] {
            store
                .create_stock_item(&NewStockItem {
                    store_id: shop.id,
                    product_id: p.id,
                    price: price.parse().unwrap(),
                    quantity: 10,
                    sector: Some(sector.to_owned()),
                })
                .await
                .unwrap();
        }

        let list = service.create_list(&owner, "Semana").await.unwrap();
        service.add_item(&owner, list.id, item(&caviar, 1)).await.unwrap();
        service.add_item(&owner, list.id, item(&milk, 2)).await.unwrap();
        service.add_item(&owner, list.id, item(&rice, 1)).await.unwrap();

        let priced = service.priced_view(&owner, list.id, shop.id).await.unwrap();
        let names: Vec<_> = priced.items.iter().map(|i| i.product_name.as_str()).collect();
        assert_eq!(names, ["Arroz", "Leite", "Caviar"]);
        assert_eq!(priced.estimated_total, "31.90".parse::<Decimal>().unwrap());
        assert_eq!(priced.unavailable, 1);

        assert!(matches!(
            service.priced_view(&owner, list.id, StoreId::new(999)).await,
            Err(ShoppingListError::StoreNotFound)
        ));
    }
}
