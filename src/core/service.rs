//! Store traits for orders, the catalog and users
//!
//! The order service is agnostic to the storage mechanism: every backend
//! implements these traits (plus [`StockLedger`](crate::core::stock::StockLedger))
//! and is handed to the service as trait objects.

use crate::core::query::ProductFilter;
use crate::entities::{Category, Order, Product, User};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Get an order by ID
    async fn get(&self, id: &Uuid) -> Result<Option<Order>>;

    /// List orders, newest first, optionally restricted to one owner
    async fn list(&self, owner: Option<&Uuid>) -> Result<Vec<Order>>;

    /// Replace an existing order
    ///
    /// Fails if no order with the same ID exists.
    async fn update(&self, order: Order) -> Result<Order>;

    /// Delete an order, returning whether a record was removed
    async fn delete(&self, id: &Uuid) -> Result<bool>;
}

/// Read access to products and categories, plus the writes used for seeding
///
/// Product stock is not written here: `save_product` keeps whatever stock the
/// record carries, and runtime changes go through the stock ledger.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Get a product by ID
    async fn get_product(&self, id: &Uuid) -> Result<Option<Product>>;

    /// List active products matching a filter, newest first
    ///
    /// Returns the requested page and the total number of matches.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Product>, usize)>;

    /// Insert or replace a product
    async fn save_product(&self, product: Product) -> Result<Product>;

    /// Get a category by ID
    async fn get_category(&self, id: &Uuid) -> Result<Option<Category>>;

    /// List active categories ordered by name
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Insert or replace a category; names are unique
    async fn save_category(&self, category: Category) -> Result<Category>;
}

/// Persistence for users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: &Uuid) -> Result<Option<User>>;

    /// Find a user by email (case-insensitive)
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a new user; emails are unique
    async fn insert_user(&self, user: User) -> Result<User>;
}
