//! In-memory repositories for tests.
//!
//! [`MemoryStore`] implements every repository trait over one shared,
//! mutex-guarded data set. It mirrors the constraints the Postgres schema
//! enforces (unique emails and tax ids, foreign keys, delete cascades) so
//! service and HTTP tests exercise the same error paths without a database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use localiza_core::{
    AccountId, CategoryId, Email, ProductId, Role, ShoppingListId, ShoppingListItemId,
    StockItemId, StoreId,
};

use super::{
    AccountRepository, CatalogRepository, Credentials, FieldValue, PartialUpdate,
    RepositoryError, ShoppingListRepository, StoreRepository, UnitOfWork, UpdateTable,
};
use crate::models::{
    Account, Category, ListItemDetail, NewAccount, NewCategory, NewListItem, NewProduct,
    NewStockItem, NewStore, PricedListItem, Product, ShoppingList, ShoppingListItem,
    ShoppingListSummary, StockItem, Store, StoreProduct,
};

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_hash: String,
}

#[derive(Debug, Default)]
struct MemoryData {
    last_id: i64,
    accounts: Vec<StoredAccount>,
    stores: Vec<Store>,
    lists: Vec<ShoppingList>,
    items: Vec<ShoppingListItem>,
    products: Vec<Product>,
    categories: Vec<Category>,
    stock: Vec<StockItem>,
    fail_store_inserts: bool,
}

impl MemoryData {
    /// Ids come from one sequence and, like Postgres sequences, are never
    /// handed out twice even when the insert is rolled back.
    const fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &Email) -> bool {
        self.accounts.iter().any(|a| &a.account.email == email)
    }

    fn store_exists(&self, id: StoreId) -> bool {
        self.stores.iter().any(|s| s.id == id)
    }

    fn product_exists(&self, id: ProductId) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    fn category_exists(&self, id: CategoryId) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    fn find_product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

fn injected_failure() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

fn missing(constraint: &str) -> RepositoryError {
    RepositoryError::MissingReference(constraint.to_owned())
}

fn unknown_column(column: &str) -> RepositoryError {
    RepositoryError::Database(sqlx::Error::ColumnNotFound(column.to_owned()))
}

fn check_account_shape(account: &NewAccount) -> Result<(), RepositoryError> {
    if account.role.requires_store() && account.store_id.is_none() {
        return Err(RepositoryError::Invalid(
            "users_store_admin_has_store".to_owned(),
        ));
    }
    Ok(())
}

/// Shared in-memory backend; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent store insert fail with a storage error.
    pub async fn fail_store_inserts(&self, fail: bool) {
        self.data.lock().await.fail_store_inserts = fail;
    }

    pub async fn store_count(&self) -> usize {
        self.data.lock().await.stores.len()
    }

    pub async fn account_count(&self) -> usize {
        self.data.lock().await.accounts.len()
    }

    pub async fn accounts_with_role(&self, role: Role) -> Vec<Account> {
        self.data
            .lock()
            .await
            .accounts
            .iter()
            .filter(|a| a.account.role == role)
            .map(|a| a.account.clone())
            .collect()
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        check_account_shape(account)?;
        let mut data = self.data.lock().await;
        if data.email_taken(&account.email) {
            return Err(RepositoryError::Conflict("email already registered".to_owned()));
        }
        if let Some(store_id) = account.store_id
            && !data.store_exists(store_id)
        {
            return Err(missing("users_store_id_fkey"));
        }

        let stored = StoredAccount {
            account: Account {
                id: AccountId::new(data.next_id()),
                name: account.name.clone(),
                email: account.email.clone(),
                phone: account.phone.clone(),
                role: account.role,
                store_id: account.store_id,
                created_at: Utc::now(),
            },
            password_hash: account.password_hash.clone(),
        };
        let created = stored.account.clone();
        data.accounts.push(stored);
        Ok(created)
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .accounts
            .iter()
            .find(|a| a.account.id == id)
            .map(|a| a.account.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<Credentials>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .accounts
            .iter()
            .find(|a| &a.account.email == email)
            .map(|a| Credentials {
                account: a.account.clone(),
                password_hash: a.password_hash.clone(),
            }))
    }

    async fn update_role(
        &self,
        email: &Email,
        role: Role,
        store_id: Option<StoreId>,
    ) -> Result<Account, RepositoryError> {
        let mut data = self.data.lock().await;
        if role.requires_store() && store_id.is_none() {
            return Err(RepositoryError::Invalid("users_store_admin_has_store".to_owned()));
        }
        if let Some(store_id) = store_id
            && !data.store_exists(store_id)
        {
            return Err(missing("users_store_id_fkey"));
        }

        let stored = data
            .accounts
            .iter_mut()
            .find(|a| &a.account.email == email)
            .ok_or(RepositoryError::NotFound)?;
        stored.account.role = role;
        stored.account.store_id = store_id;
        Ok(stored.account.clone())
    }
}

// =============================================================================
// Stores
// =============================================================================

#[async_trait]
impl StoreRepository for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let mut stores = self.data.lock().await.stores.clone();
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let mut data = self.data.lock().await;
        if data.fail_store_inserts {
            return Err(injected_failure());
        }
        if data.stores.iter().any(|s| s.tax_id == store.tax_id) {
            return Err(RepositoryError::Conflict("tax id already registered".to_owned()));
        }
        let created = Store {
            id: StoreId::new(data.next_id()),
            name: store.name.clone(),
            address: store.address.clone(),
            tax_id: store.tax_id.clone(),
            created_at: Utc::now(),
        };
        data.stores.push(created.clone());
        Ok(created)
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        Ok(Box::new(MemoryUnitOfWork {
            data: Arc::clone(&self.data),
            stores: Vec::new(),
            accounts: Vec::new(),
        }))
    }
}

/// Staged writes, applied to the shared data only on commit.
struct MemoryUnitOfWork {
    data: Arc<Mutex<MemoryData>>,
    stores: Vec<Store>,
    accounts: Vec<StoredAccount>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_store(&mut self, store: &NewStore) -> Result<Store, RepositoryError> {
        let mut data = self.data.lock().await;
        if data.fail_store_inserts {
            return Err(injected_failure());
        }
        let taken = data.stores.iter().chain(&self.stores).any(|s| s.tax_id == store.tax_id);
        if taken {
            return Err(RepositoryError::Conflict("tax id already registered".to_owned()));
        }
        let created = Store {
            id: StoreId::new(data.next_id()),
            name: store.name.clone(),
            address: store.address.clone(),
            tax_id: store.tax_id.clone(),
            created_at: Utc::now(),
        };
        self.stores.push(created.clone());
        Ok(created)
    }

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, RepositoryError> {
        check_account_shape(account)?;
        let mut data = self.data.lock().await;
        let taken = data.email_taken(&account.email)
            || self.accounts.iter().any(|a| a.account.email == account.email);
        if taken {
            return Err(RepositoryError::Conflict("email already registered".to_owned()));
        }
        if let Some(store_id) = account.store_id
            && !data.store_exists(store_id)
            && !self.stores.iter().any(|s| s.id == store_id)
        {
            return Err(missing("users_store_id_fkey"));
        }

        let stored = StoredAccount {
            account: Account {
                id: AccountId::new(data.next_id()),
                name: account.name.clone(),
                email: account.email.clone(),
                phone: account.phone.clone(),
                role: account.role,
                store_id: account.store_id,
                created_at: Utc::now(),
            },
            password_hash: account.password_hash.clone(),
        };
        let created = stored.account.clone();
        self.accounts.push(stored);
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self {
            data,
            stores,
            accounts,
        } = *self;
        let mut data = data.lock().await;

        // Another writer may have claimed a tax id or email since it was staged
        if stores
            .iter()
            .any(|staged| data.stores.iter().any(|s| s.tax_id == staged.tax_id))
        {
            return Err(RepositoryError::Conflict("tax id already registered".to_owned()));
        }
        if accounts.iter().any(|a| data.email_taken(&a.account.email)) {
            return Err(RepositoryError::Conflict("email already registered".to_owned()));
        }
        data.stores.extend(stores);
        data.accounts.extend(accounts);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

// =============================================================================
// Shopping lists
// =============================================================================

#[async_trait]
impl ShoppingListRepository for MemoryStore {
    async fn create_list(
        &self,
        owner: AccountId,
        name: &str,
    ) -> Result<ShoppingList, RepositoryError> {
        let mut data = self.data.lock().await;
        if !data.accounts.iter().any(|a| a.account.id == owner) {
            return Err(missing("shopping_lists_owner_id_fkey"));
        }
        let list = ShoppingList {
            id: ShoppingListId::new(data.next_id()),
            owner_id: owner,
            name: name.to_owned(),
            created_at: Utc::now(),
        };
        data.lists.push(list.clone());
        Ok(list)
    }

    async fn get_list(&self, id: ShoppingListId) -> Result<Option<ShoppingList>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.lists.iter().find(|l| l.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: AccountId,
    ) -> Result<Vec<ShoppingListSummary>, RepositoryError> {
        let data = self.data.lock().await;
        let mut summaries: Vec<_> = data
            .lists
            .iter()
            .filter(|l| l.owner_id == owner)
            .map(|l| ShoppingListSummary {
                id: l.id,
                name: l.name.clone(),
                created_at: l.created_at,
                item_count: i64::try_from(data.items.iter().filter(|i| i.list_id == l.id).count())
                    .unwrap_or(i64::MAX),
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    async fn create_item(
        &self,
        list_id: ShoppingListId,
        item: NewListItem,
    ) -> Result<ShoppingListItem, RepositoryError> {
        let mut data = self.data.lock().await;
        if !data.lists.iter().any(|l| l.id == list_id) {
            return Err(missing("shopping_list_items_list_id_fkey"));
        }
        if !data.product_exists(item.product_id) {
            return Err(missing("shopping_list_items_product_id_fkey"));
        }
        let created = ShoppingListItem {
            id: ShoppingListItemId::new(data.next_id()),
            list_id,
            product_id: item.product_id,
            quantity: item.quantity,
            is_checked: false,
        };
        data.items.push(created.clone());
        Ok(created)
    }

    async fn list_items(
        &self,
        list_id: ShoppingListId,
    ) -> Result<Vec<ListItemDetail>, RepositoryError> {
        let data = self.data.lock().await;
        let mut details: Vec<_> = data
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .filter_map(|i| {
                data.find_product(i.product_id).map(|p| ListItemDetail {
                    id: i.id,
                    product_id: i.product_id,
                    product_name: p.name.clone(),
                    quantity: i.quantity,
                    is_checked: i.is_checked,
                })
            })
            .collect();
        details.sort_by_key(|d| d.id);
        Ok(details)
    }

    async fn set_item_checked(
        &self,
        list_id: ShoppingListId,
        item_id: ShoppingListItemId,
        checked: bool,
    ) -> Result<ShoppingListItem, RepositoryError> {
        let mut data = self.data.lock().await;
        let item = data
            .items
            .iter_mut()
            .find(|i| i.id == item_id && i.list_id == list_id)
            .ok_or(RepositoryError::NotFound)?;
        item.is_checked = checked;
        Ok(item.clone())
    }

    async fn priced_items(
        &self,
        list_id: ShoppingListId,
        store_id: StoreId,
    ) -> Result<Vec<PricedListItem>, RepositoryError> {
        let data = self.data.lock().await;
        let mut priced: Vec<_> = data
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .filter_map(|i| {
                let product = data.find_product(i.product_id)?;
                let stock = data
                    .stock
                    .iter()
                    .find(|s| s.store_id == store_id && s.product_id == i.product_id);
                Some(PricedListItem {
                    item_id: i.id,
                    product_id: i.product_id,
                    product_name: product.name.clone(),
                    description: product.description.clone(),
                    quantity: i.quantity,
                    is_checked: i.is_checked,
                    unit_price: stock.map(|s| s.price),
                    sector: stock.and_then(|s| s.sector.clone()),
                })
            })
            .collect();
        priced.sort_by(|a, b| {
            (a.sector.is_none(), &a.sector, &a.product_name, a.item_id).cmp(&(
                b.sector.is_none(),
                &b.sector,
                &b.product_name,
                b.item_id,
            ))
        });
        Ok(priced)
    }
}

// =============================================================================
// Catalog
// =============================================================================

fn apply_to_product(
    data: &MemoryData,
    product: &mut Product,
    column: &str,
    value: &FieldValue,
) -> Result<(), RepositoryError> {
    match (column, value) {
        ("name", FieldValue::Text(v)) => product.name.clone_from(v),
        ("description", FieldValue::Text(v)) => product.description.clone_from(v),
        ("brand", FieldValue::Text(v)) => product.brand = Some(v.clone()),
        ("image_url", FieldValue::Text(v)) => product.image_url = Some(v.clone()),
        ("category_id", FieldValue::BigInt(v)) => {
            let id = CategoryId::new(*v);
            if !data.category_exists(id) {
                return Err(missing("products_category_id_fkey"));
            }
            product.category_id = Some(id);
        }
        _ => return Err(unknown_column(column)),
    }
    Ok(())
}

fn apply_to_category(
    data: &MemoryData,
    category: &mut Category,
    column: &str,
    value: &FieldValue,
) -> Result<(), RepositoryError> {
    match (column, value) {
        ("name", FieldValue::Text(v)) => category.name.clone_from(v),
        ("parent_id", FieldValue::BigInt(v)) => {
            let id = CategoryId::new(*v);
            if !data.category_exists(id) {
                return Err(missing("categories_parent_id_fkey"));
            }
            category.parent_id = Some(id);
        }
        _ => return Err(unknown_column(column)),
    }
    Ok(())
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.data.lock().await.products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn search_products(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let needle = term.to_lowercase();
        let mut products: Vec<_> = self
            .data
            .lock()
            .await
            .products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut data = self.data.lock().await;
        if let Some(category_id) = product.category_id
            && !data.category_exists(category_id)
        {
            return Err(missing("products_category_id_fkey"));
        }
        let created = Product {
            id: ProductId::new(data.next_id()),
            name: product.name.clone(),
            description: product.description.clone(),
            brand: product.brand.clone(),
            image_url: product.image_url.clone(),
            category_id: product.category_id,
            created_at: Utc::now(),
        };
        data.products.push(created.clone());
        Ok(created)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut data = self.data.lock().await;
        if !data.product_exists(id) {
            return Err(RepositoryError::NotFound);
        }
        data.products.retain(|p| p.id != id);
        data.items.retain(|i| i.product_id != id);
        data.stock.retain(|s| s.product_id != id);
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.data.lock().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let mut data = self.data.lock().await;
        if data.categories.iter().any(|c| c.name == category.name) {
            return Err(RepositoryError::Conflict("category already exists".to_owned()));
        }
        if let Some(parent_id) = category.parent_id
            && !data.category_exists(parent_id)
        {
            return Err(missing("categories_parent_id_fkey"));
        }
        let created = Category {
            id: CategoryId::new(data.next_id()),
            name: category.name.clone(),
            parent_id: category.parent_id,
        };
        data.categories.push(created.clone());
        Ok(created)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut data = self.data.lock().await;
        if !data.category_exists(id) {
            return Err(RepositoryError::NotFound);
        }
        data.categories.retain(|c| c.id != id);
        for child in data.categories.iter_mut().filter(|c| c.parent_id == Some(id)) {
            child.parent_id = None;
        }
        for product in data.products.iter_mut().filter(|p| p.category_id == Some(id)) {
            product.category_id = None;
        }
        Ok(())
    }

    async fn apply_update(&self, update: &PartialUpdate) -> Result<(), RepositoryError> {
        if update.is_empty() {
            return Err(RepositoryError::NoFieldsProvided);
        }
        let mut data = self.data.lock().await;

        // Apply to a copy so a failing column leaves the row untouched
        match update.table() {
            UpdateTable::Products => {
                let index = data
                    .products
                    .iter()
                    .position(|p| p.id.as_i64() == update.id())
                    .ok_or(RepositoryError::NotFound)?;
                let mut row = data.products.get(index).cloned().ok_or(RepositoryError::NotFound)?;
                for (column, value) in update.assignments() {
                    apply_to_product(&data, &mut row, column, value)?;
                }
                if let Some(slot) = data.products.get_mut(index) {
                    *slot = row;
                }
            }
            UpdateTable::Categories => {
                let index = data
                    .categories
                    .iter()
                    .position(|c| c.id.as_i64() == update.id())
                    .ok_or(RepositoryError::NotFound)?;
                let mut row = data
                    .categories
                    .get(index)
                    .cloned()
                    .ok_or(RepositoryError::NotFound)?;
                for (column, value) in update.assignments() {
                    apply_to_category(&data, &mut row, column, value)?;
                }
                let name_taken = data
                    .categories
                    .iter()
                    .any(|c| c.id != row.id && c.name == row.name);
                if name_taken {
                    return Err(RepositoryError::Conflict("value already in use".to_owned()));
                }
                if let Some(slot) = data.categories.get_mut(index) {
                    *slot = row;
                }
            }
        }
        Ok(())
    }

    async fn create_stock_item(&self, item: &NewStockItem) -> Result<StockItem, RepositoryError> {
        let mut data = self.data.lock().await;
        if !data.store_exists(item.store_id) {
            return Err(missing("stock_items_store_id_fkey"));
        }
        if !data.product_exists(item.product_id) {
            return Err(missing("stock_items_product_id_fkey"));
        }
        let duplicate = data
            .stock
            .iter()
            .any(|s| s.store_id == item.store_id && s.product_id == item.product_id);
        if duplicate {
            return Err(RepositoryError::Conflict(
                "store already stocks this product".to_owned(),
            ));
        }
        let created = StockItem {
            id: StockItemId::new(data.next_id()),
            store_id: item.store_id,
            product_id: item.product_id,
            price: item.price,
            quantity: item.quantity,
            sector: item.sector.clone(),
        };
        data.stock.push(created.clone());
        Ok(created)
    }

    async fn list_store_products(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreProduct>, RepositoryError> {
        let data = self.data.lock().await;
        let mut products: Vec<_> = data
            .stock
            .iter()
            .filter(|s| s.store_id == store_id)
            .filter_map(|s| {
                data.find_product(s.product_id).map(|p| StoreProduct {
                    product_id: s.product_id,
                    name: p.name.clone(),
                    description: p.description.clone(),
                    price: s.price,
                    quantity: s.quantity,
                    sector: s.sector.clone(),
                })
            })
            .collect();
        products.sort_by(|a, b| {
            (a.sector.is_none(), &a.sector, &a.name).cmp(&(b.sector.is_none(), &b.sector, &b.name))
        });
        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: String::new(),
            brand: None,
            image_url: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_leaves_nothing_behind() {
        let store = MemoryStore::new();
        {
            let mut uow = StoreRepository::begin(&store).await.unwrap();
            uow.insert_store(&NewStore {
                name: "Mercado Sol".to_owned(),
                address: "Rua A, 1".to_owned(),
                tax_id: localiza_core::TaxId::parse("12345678000190").unwrap(),
            })
            .await
            .unwrap();
        }
        assert_eq!(store.store_count().await, 0);
    }

    #[tokio::test]
    async fn test_commit_rechecks_tax_id_claimed_meanwhile() {
        let store = MemoryStore::new();
        let new_store = NewStore {
            name: "Mercado Sol".to_owned(),
            address: "Rua A, 1".to_owned(),
            tax_id: localiza_core::TaxId::parse("12345678000190").unwrap(),
        };

        let mut uow = StoreRepository::begin(&store).await.unwrap();
        uow.insert_store(&new_store).await.unwrap();
        StoreRepository::create(&store, &new_store).await.unwrap();

        assert!(matches!(
            uow.commit().await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(store.store_count().await, 1);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_columns() {
        let store = MemoryStore::new();
        let product = store.create_product(&new_product("Arroz")).await.unwrap();

        let update = PartialUpdate::new(UpdateTable::Products, product.id)
            .set("brand", Some("Tio João".to_owned()));
        store.apply_update(&update).await.unwrap();

        let updated = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(updated.brand.as_deref(), Some("Tio João"));
        assert_eq!(updated.name, "Arroz");
        assert_eq!(updated.created_at, product.created_at);
    }

    #[tokio::test]
    async fn test_partial_update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let update = PartialUpdate::new(UpdateTable::Products, 99_i64)
            .set("name", Some("Ghost".to_owned()));
        assert!(matches!(
            store.apply_update(&update).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_product_cascades_to_list_items() {
        let store = MemoryStore::new();
        let product = store.create_product(&new_product("Leite")).await.unwrap();
        let owner = AccountRepository::create(
            &store,
            &NewAccount::customer(
                "Ana".to_owned(),
                Email::parse("ana@x.com").unwrap(),
                None,
                "hash".to_owned(),
            ),
        )
        .await
        .unwrap();
        let list = store.create_list(owner.id, "Semana").await.unwrap();
        store
            .create_item(
                list.id,
                NewListItem {
                    product_id: product.id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();

        store.delete_product(product.id).await.unwrap();
        assert!(store.list_items(list.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        store.create_product(&new_product("Café Torrado")).await.unwrap();
        store.create_product(&new_product("Açúcar")).await.unwrap();

        let found = store.search_products("CAFÉ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().unwrap().name, "Café Torrado");
    }
}
