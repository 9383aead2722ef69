//! In-memory implementation of every store trait, for testing and development

use crate::core::query::ProductFilter;
use crate::core::service::{CatalogStore, OrderStore, UserStore};
use crate::core::stock::{
    AdjustmentKind, LedgerEntry, StockAdjustment, StockError, StockLedger, StockLine,
};
use crate::entities::product::search_pattern;
use crate::entities::user::normalize_email;
use crate::entities::{Category, Order, Product, User};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    /// Ledger entries by `LedgerEntry::key`
    ledger: HashMap<String, LedgerEntry>,
}

impl State {
    fn entry(&self, order_id: &Uuid, kind: AdjustmentKind) -> Option<&LedgerEntry> {
        self.ledger.get(&LedgerEntry::key(order_id, kind))
    }

    fn record(&mut self, entry: LedgerEntry) {
        self.ledger.insert(entry.id.clone(), entry);
    }
}

/// In-memory store
///
/// All collections sit behind a single lock, so a stock reservation checks
/// and decrements every line while holding the write guard: concurrent
/// reservations on the same product are serialized. Clones share the same
/// data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        let mut state = self.write()?;

        if state.orders.contains_key(&order.id) {
            return Err(anyhow!("Order already exists: {}", order.id));
        }
        state.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        Ok(self.read()?.orders.get(id).cloned())
    }

    async fn list(&self, owner: Option<&Uuid>) -> Result<Vec<Order>> {
        let state = self.read()?;

        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| owner.is_none_or(|owner| order.is_owned_by(owner)))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders)
    }

    async fn update(&self, order: Order) -> Result<Order> {
        let mut state = self.write()?;

        let slot = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| anyhow!("Order not found: {}", order.id))?;
        *slot = order.clone();

        Ok(order)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        Ok(self.write()?.orders.remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, id: &Uuid) -> Result<Option<Product>> {
        Ok(self.read()?.products.get(id).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Product>, usize)> {
        let pattern = filter
            .search
            .as_deref()
            .map(search_pattern)
            .transpose()
            .map_err(|e| anyhow!("Invalid search pattern: {}", e))?;

        let state = self.read()?;

        let mut matches: Vec<&Product> = state
            .products
            .values()
            .filter(|p| p.is_active)
            .filter(|p| filter.category.is_none_or(|c| p.category == c))
            .filter(|p| !filter.featured_only || p.is_featured)
            .filter(|p| pattern.as_ref().is_none_or(|re| p.matches_search(re)))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len();
        let page = matches.into_iter().skip(skip).take(limit).cloned().collect();

        Ok((page, total))
    }

    async fn save_product(&self, product: Product) -> Result<Product> {
        self.write()?.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_category(&self, id: &Uuid) -> Result<Option<Category>> {
        Ok(self.read()?.categories.get(id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.read()?;

        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    async fn save_category(&self, category: Category) -> Result<Category> {
        let mut state = self.write()?;

        let taken = state
            .categories
            .values()
            .any(|c| c.id != category.id && c.name.eq_ignore_ascii_case(&category.name));
        if taken {
            return Err(anyhow!("Category '{}' already exists", category.name));
        }
        state.categories.insert(category.id, category.clone());

        Ok(category)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, mut user: User) -> Result<User> {
        user.email = normalize_email(&user.email);
        let mut state = self.write()?;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(anyhow!("A user with email '{}' already exists", user.email));
        }
        state.users.insert(user.id, user.clone());

        Ok(user)
    }
}

// ---------------------------------------------------------------------------
// Stock ledger
// ---------------------------------------------------------------------------

#[async_trait]
impl StockLedger for InMemoryStore {
    async fn reserve(&self, order_id: &Uuid, lines: &[StockLine]) -> Result<(), StockError> {
        let lines = StockLine::aggregate(lines)?;
        let mut state = self.write()?;

        if state.entry(order_id, AdjustmentKind::Reserve).is_some() {
            tracing::debug!(order_id = %order_id, "stock already reserved");
            return Ok(());
        }

        // Check every line before touching any of them
        for line in &lines {
            let product = state.products.get(&line.product_id).ok_or(
                StockError::ProductNotFound {
                    product_id: line.product_id,
                },
            )?;
            if product.stock < line.quantity {
                return Err(StockError::Insufficient {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
        }

        for line in &lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
            }
        }
        state.record(LedgerEntry::new(*order_id, AdjustmentKind::Reserve, lines));

        Ok(())
    }

    async fn release(&self, order_id: &Uuid) -> Result<bool, StockError> {
        let mut state = self.write()?;

        if state.entry(order_id, AdjustmentKind::Release).is_some() {
            return Ok(false);
        }

        let Some(lines) = state
            .entry(order_id, AdjustmentKind::Reserve)
            .map(|entry| entry.lines.clone())
        else {
            return Ok(false);
        };

        for line in &lines {
            match state.products.get_mut(&line.product_id) {
                Some(product) => product.stock += line.quantity,
                None => tracing::warn!(
                    order_id = %order_id,
                    product_id = %line.product_id,
                    "product vanished before its stock could be released"
                ),
            }
        }
        state.record(LedgerEntry::new(*order_id, AdjustmentKind::Release, lines));

        Ok(true)
    }

    async fn adjustments(&self, order_id: &Uuid) -> Result<Vec<StockAdjustment>, StockError> {
        let state = self.read()?;

        // A release is only ever recorded after its reservation
        Ok([AdjustmentKind::Reserve, AdjustmentKind::Release]
            .into_iter()
            .filter_map(|kind| state.entry(order_id, kind))
            .flat_map(LedgerEntry::adjustments)
            .collect())
    }
}
