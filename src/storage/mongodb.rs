//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides [`MongoStore`], which implements every store trait plus the
//! [`StockLedger`] on top of a `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! One collection per document type, named after `Entity::resource_name()`
//! (`users`, `categories`, `products`, `orders`), plus a `stock_adjustments`
//! collection holding the ledger entries.
//!
//! # Serialization strategy
//!
//! Documents are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs and timestamps are stored as
//! strings, timestamps with a fixed number of fraction digits so that sorting
//! on them is chronological. The `id` field is mapped to MongoDB's `_id`
//! convention.
//!
//! # Stock reservations
//!
//! A reservation first claims its ledger entry: the entry's `_id` is
//! `{order_id}:reserve`, so a second insert for the same order fails with a
//! duplicate key and the reservation is a no-op. Each line is then applied
//! with a single conditional update (`stock >= quantity` together with
//! `$inc`), so no other writer can slip between the check and the
//! decrement. If a line fails, the lines already applied are given back and
//! the claim is removed.
//!
//! A release claims `{order_id}:release` the same way. If giving back a line
//! fails, the lines already given back are withdrawn again and the claim is
//! removed, so a retried release restores every line.

use crate::core::entity::Entity;
use crate::core::query::ProductFilter;
use crate::core::service::{CatalogStore, OrderStore, UserStore};
use crate::core::stock::{
    AdjustmentKind, LedgerEntry, StockAdjustment, StockError, StockLedger, StockLine,
};
use crate::entities::user::normalize_email;
use crate::entities::{Category, Order, Product, User};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Collection, Database, IndexModel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

const LEDGER_COLLECTION: &str = "stock_adjustments";

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    let json = serde_json::to_value(value).map_err(|e| anyhow!("Failed to serialize: {}", e))?;
    json_to_document(json)
}

fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(document_to_json(doc))
        .map_err(|e| anyhow!("Failed to deserialize document: {}", e))
}

/// Convert a UUID to its BSON string representation for queries.
fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

fn product_filter_document(filter: &ProductFilter) -> Document {
    let mut query = doc! { "isActive": true };

    if let Some(category) = &filter.category {
        query.insert("category", uuid_bson(category));
    }
    if filter.featured_only {
        query.insert("isFeatured", true);
    }
    if let Some(term) = &filter.search {
        let pattern = regex::escape(term);
        query.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }

    query
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// Order, catalog, user and stock storage backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use livewear::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::new(client.database("livewear"));
/// store.ensure_indexes().await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a new `MongoStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Connect to `uri` and use the database `name`.
    pub async fn connect(uri: &str, name: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .map_err(|e| anyhow!("Failed to connect to MongoDB: {}", e))?;
        Ok(Self::new(client.database(name)))
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection<T: Entity>(&self) -> Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn ledger(&self) -> Collection<Document> {
        self.database.collection(LEDGER_COLLECTION)
    }

    /// Create the indexes the store relies on.
    ///
    /// - `users.email` unique
    /// - `categories.name` unique
    /// - `products` by `isActive, category` and `createdAt`
    /// - `orders` by `user, createdAt`
    /// - `stock_adjustments.orderId`
    ///
    /// This method is idempotent and safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<()> {
        use mongodb::options::IndexOptions;

        let unique = || IndexOptions::builder().unique(true).build();

        self.collection::<User>()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create indexes on users: {}", e))?;

        self.collection::<Category>()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create indexes on categories: {}", e))?;

        self.collection::<Product>()
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "isActive": 1, "category": 1 })
                    .build(),
                IndexModel::builder().keys(doc! { "createdAt": -1 }).build(),
            ])
            .await
            .map_err(|e| anyhow!("Failed to create indexes on products: {}", e))?;

        self.collection::<Order>()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user": 1, "createdAt": -1 })
                    .build(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create indexes on orders: {}", e))?;

        self.ledger()
            .create_index(IndexModel::builder().keys(doc! { "orderId": 1 }).build())
            .await
            .map_err(|e| anyhow!("Failed to create indexes on {}: {}", LEDGER_COLLECTION, e))?;

        Ok(())
    }

    async fn find_by_id<T: Entity + DeserializeOwned>(&self, id: &Uuid) -> Result<Option<T>> {
        let doc = self
            .collection::<T>()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get {}: {}", T::resource_name_singular(), e))?;

        doc.map(from_document).transpose()
    }

    async fn upsert<T: Entity + Serialize>(&self, entity: &T) -> Result<()> {
        self.collection::<T>()
            .replace_one(doc! { "_id": uuid_bson(&entity.id()) }, to_document(entity)?)
            .upsert(true)
            .await
            .map_err(|e| anyhow!("Failed to save {}: {}", T::resource_name_singular(), e))?;
        Ok(())
    }

    async fn find_entry(&self, order_id: &Uuid, kind: AdjustmentKind) -> Result<Option<LedgerEntry>> {
        let doc = self
            .ledger()
            .find_one(doc! { "_id": LedgerEntry::key(order_id, kind) })
            .await
            .map_err(|e| anyhow!("Failed to read stock ledger: {}", e))?;

        doc.map(from_document).transpose()
    }

    /// Insert a ledger entry; `false` if an entry with the same key exists.
    async fn claim(&self, entry: &LedgerEntry) -> Result<bool> {
        match self.ledger().insert_one(to_document(entry)?).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(anyhow!("Failed to write stock ledger: {}", e)),
        }
    }

    /// Decrement one product's stock if it has enough; `false` otherwise.
    async fn take(&self, line: &StockLine) -> Result<bool> {
        let quantity = i64::from(line.quantity);
        let result = self
            .collection::<Product>()
            .update_one(
                doc! { "_id": uuid_bson(&line.product_id), "stock": { "$gte": quantity } },
                doc! { "$inc": { "stock": -quantity } },
            )
            .await
            .map_err(|e| anyhow!("Failed to reserve stock: {}", e))?;

        Ok(result.matched_count == 1)
    }

    async fn give_back(&self, line: &StockLine) -> Result<bool> {
        let result = self
            .collection::<Product>()
            .update_one(
                doc! { "_id": uuid_bson(&line.product_id) },
                doc! { "$inc": { "stock": i64::from(line.quantity) } },
            )
            .await
            .map_err(|e| anyhow!("Failed to release stock: {}", e))?;

        Ok(result.matched_count == 1)
    }

    /// Take back stock that a failed release had already returned.
    ///
    /// Unconditional: the units were added by the same release moments ago.
    async fn withdraw(&self, line: &StockLine) -> Result<()> {
        self.collection::<Product>()
            .update_one(
                doc! { "_id": uuid_bson(&line.product_id) },
                doc! { "$inc": { "stock": -i64::from(line.quantity) } },
            )
            .await
            .map_err(|e| anyhow!("Failed to withdraw stock: {}", e))?;

        Ok(())
    }

    /// Explain why `line` could not be taken.
    async fn shortage(&self, line: &StockLine) -> Result<StockError> {
        Ok(match self.find_by_id::<Product>(&line.product_id).await? {
            None => StockError::ProductNotFound {
                product_id: line.product_id,
            },
            Some(product) => StockError::Insufficient {
                product_id: product.id,
                product_name: product.name,
                requested: line.quantity,
                available: product.stock,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderStore for MongoStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        self.collection::<Order>()
            .insert_one(to_document(&order)?)
            .await
            .map_err(|e| anyhow!("Failed to create order: {}", e))?;

        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        self.find_by_id(id).await
    }

    async fn list(&self, owner: Option<&Uuid>) -> Result<Vec<Order>> {
        let filter = match owner {
            Some(owner) => doc! { "user": uuid_bson(owner) },
            None => doc! {},
        };

        let cursor = self
            .collection::<Order>()
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(|e| anyhow!("Failed to list orders: {}", e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect orders: {}", e))?;

        docs.into_iter().map(from_document).collect()
    }

    async fn update(&self, order: Order) -> Result<Order> {
        let result = self
            .collection::<Order>()
            .replace_one(doc! { "_id": uuid_bson(&order.id) }, to_document(&order)?)
            .await
            .map_err(|e| anyhow!("Failed to update order: {}", e))?;

        if result.matched_count == 0 {
            return Err(anyhow!("Order not found: {}", order.id));
        }

        Ok(order)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .collection::<Order>()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete order: {}", e))?;

        Ok(result.deleted_count > 0)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[async_trait]
impl CatalogStore for MongoStore {
    async fn get_product(&self, id: &Uuid) -> Result<Option<Product>> {
        self.find_by_id(id).await
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Product>, usize)> {
        let query = product_filter_document(filter);

        let total = self
            .collection::<Product>()
            .count_documents(query.clone())
            .await
            .map_err(|e| anyhow!("Failed to count products: {}", e))?;

        let cursor = self
            .collection::<Product>()
            .find(query)
            .sort(doc! { "createdAt": -1 })
            .skip(skip as u64)
            .limit(limit as i64)
            .await
            .map_err(|e| anyhow!("Failed to list products: {}", e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect products: {}", e))?;

        let products = docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<Product>>>()?;

        Ok((products, total as usize))
    }

    async fn save_product(&self, product: Product) -> Result<Product> {
        self.upsert(&product).await?;
        Ok(product)
    }

    async fn get_category(&self, id: &Uuid) -> Result<Option<Category>> {
        self.find_by_id(id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let cursor = self
            .collection::<Category>()
            .find(doc! { "isActive": true })
            .sort(doc! { "name": 1 })
            .await
            .map_err(|e| anyhow!("Failed to list categories: {}", e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect categories: {}", e))?;

        docs.into_iter().map(from_document).collect()
    }

    async fn save_category(&self, category: Category) -> Result<Category> {
        self.upsert(&category).await?;
        Ok(category)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserStore for MongoStore {
    async fn get_user(&self, id: &Uuid) -> Result<Option<User>> {
        self.find_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let doc = self
            .collection::<User>()
            .find_one(doc! { "email": normalize_email(email) })
            .await
            .map_err(|e| anyhow!("Failed to find user: {}", e))?;

        doc.map(from_document).transpose()
    }

    async fn insert_user(&self, mut user: User) -> Result<User> {
        user.email = normalize_email(&user.email);

        match self.collection::<User>().insert_one(to_document(&user)?).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(anyhow!(
                "A user with email '{}' already exists",
                user.email
            )),
            Err(e) => Err(anyhow!("Failed to create user: {}", e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Stock ledger
// ---------------------------------------------------------------------------

#[async_trait]
impl StockLedger for MongoStore {
    async fn reserve(&self, order_id: &Uuid, lines: &[StockLine]) -> Result<(), StockError> {
        let lines = StockLine::aggregate(lines)?;
        let entry = LedgerEntry::new(*order_id, AdjustmentKind::Reserve, lines.clone());

        if !self.claim(&entry).await? {
            tracing::debug!(order_id = %order_id, "stock already reserved");
            return Ok(());
        }

        let mut taken: Vec<&StockLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.take(line).await {
                Ok(true) => taken.push(line),
                outcome => {
                    for applied in &taken {
                        if let Err(e) = self.give_back(applied).await {
                            tracing::error!(
                                order_id = %order_id,
                                product_id = %applied.product_id,
                                error = %e,
                                "failed to roll back partial reservation"
                            );
                        }
                    }
                    self.ledger()
                        .delete_one(doc! { "_id": entry.id.as_str() })
                        .await
                        .map_err(|e| anyhow!("Failed to remove stock claim: {}", e))?;

                    return Err(match outcome {
                        Err(e) => StockError::Backend(e),
                        _ => self.shortage(line).await?,
                    });
                }
            }
        }

        Ok(())
    }

    async fn release(&self, order_id: &Uuid) -> Result<bool, StockError> {
        let Some(reserved) = self.find_entry(order_id, AdjustmentKind::Reserve).await? else {
            return Ok(false);
        };

        let entry = LedgerEntry::new(*order_id, AdjustmentKind::Release, reserved.lines);
        if !self.claim(&entry).await? {
            return Ok(false);
        }

        let mut returned: Vec<&StockLine> = Vec::with_capacity(entry.lines.len());
        for line in &entry.lines {
            match self.give_back(line).await {
                Ok(true) => returned.push(line),
                Ok(false) => tracing::warn!(
                    order_id = %order_id,
                    product_id = %line.product_id,
                    "product vanished before its stock could be released"
                ),
                Err(e) => {
                    for applied in &returned {
                        if let Err(undo) = self.withdraw(applied).await {
                            tracing::error!(
                                order_id = %order_id,
                                product_id = %applied.product_id,
                                error = %undo,
                                "failed to undo partial release"
                            );
                        }
                    }
                    self.ledger()
                        .delete_one(doc! { "_id": entry.id.as_str() })
                        .await
                        .map_err(|e| anyhow!("Failed to remove stock claim: {}", e))?;

                    return Err(StockError::Backend(e));
                }
            }
        }

        Ok(true)
    }

    async fn adjustments(&self, order_id: &Uuid) -> Result<Vec<StockAdjustment>, StockError> {
        let cursor = self
            .ledger()
            .find(doc! { "orderId": uuid_bson(order_id) })
            .sort(doc! { "at": 1 })
            .await
            .map_err(|e| anyhow!("Failed to read stock ledger: {}", e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect stock ledger: {}", e))?;

        let entries = docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<LedgerEntry>>>()?;

        Ok(entries.iter().flat_map(LedgerEntry::adjustments).collect())
    }
}
