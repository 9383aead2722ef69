//! Shared storage test harness for Livewear backends.
//!
//! Provides fixture builders and macro-generated conformance suites. Every
//! backend test file pulls the harness in and invokes the macros with a
//! factory expression producing a fresh, empty store:
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use livewear::storage::InMemoryStore;
//!
//! stock_ledger_tests!(InMemoryStore::new());
//! order_store_tests!(InMemoryStore::new());
//! ```
//!
//! The factory is re-evaluated for each generated test, so tests never share
//! state unless the factory itself does.

#![allow(dead_code)]

#[macro_use]
pub mod store_tests;

#[macro_use]
pub mod rest_tests;

use chrono::{Duration, Utc};
use livewear::core::service::{CatalogStore, UserStore};
use livewear::entities::{Category, LineItem, Order, Product, Role, ShippingAddress, User};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

pub fn sample_category(name: &str) -> Category {
    Category::new(name)
}

/// An active product priced at `price` with `stock` units
pub fn sample_product(name: &str, price: f64, stock: u32) -> Product {
    Product::new(
        name,
        format!("{} from the summer collection", name),
        price,
        Uuid::new_v4(),
        format!("{}.jpg", name.to_lowercase().replace(' ', "-")),
        stock,
    )
}

pub fn sample_user(email: &str, role: Role) -> User {
    User::new("Awa", "Diop", email, "", role)
}

pub fn sample_address() -> ShippingAddress {
    ShippingAddress {
        first_name: Some("Awa".to_string()),
        last_name: Some("Diop".to_string()),
        email: Some("awa@livewear.test".to_string()),
        phone: Some("+221770000000".to_string()),
        street: Some("12 Rue Carnot".to_string()),
        city: Some("Dakar".to_string()),
        state: None,
        postal_code: Some("10200".to_string()),
        country: Some("SN".to_string()),
    }
}

/// A pending order for `quantity` units of `product`
///
/// `age_secs` moves the creation time into the past, so ordering tests do not
/// depend on clock resolution.
pub fn sample_order(user: Uuid, product: &Product, quantity: u32, age_secs: i64) -> Order {
    let item = LineItem {
        product: product.id,
        quantity,
        price: product.price,
        size: None,
        color: None,
    };
    let mut order = Order::new(user, vec![item], sample_address());
    order.created_at = Utc::now() - Duration::seconds(age_secs);
    order.updated_at = order.created_at;
    order.total_price = product.price * f64::from(quantity);
    order.final_price = order.total_price;
    order
}

// ---------------------------------------------------------------------------
// Store helpers
// ---------------------------------------------------------------------------

pub async fn seed_product(catalog: &dyn CatalogStore, name: &str, price: f64, stock: u32) -> Product {
    catalog
        .save_product(sample_product(name, price, stock))
        .await
        .unwrap()
}

pub async fn seed_user(users: &dyn UserStore, email: &str, role: Role) -> User {
    users.insert_user(sample_user(email, role)).await.unwrap()
}

pub async fn stock_of(catalog: &dyn CatalogStore, id: &Uuid) -> u32 {
    catalog
        .get_product(id)
        .await
        .unwrap()
        .expect("product should exist")
        .stock
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}

pub fn assert_price(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected price {}, got {}",
        expected,
        actual
    );
}
