//! # Livewear order service
//!
//! The order and stock-consistency backend of the Livewear storefront.
//!
//! ## Features
//!
//! - **Order Placement**: Server-side pricing from a catalog snapshot, with discount codes from configuration
//! - **Stock Ledger**: Atomic all-or-nothing reservations keyed by order id, with an audit trail
//! - **Order Lifecycle**: Closed status enum with an explicit transition table
//! - **Ownership Rules**: Customers see and cancel their own orders; admins manage every order
//! - **Pluggable Storage**: In-memory store for development and tests, MongoDB for production
//! - **Order Events**: Lifecycle events published on a broadcast bus
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use livewear::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load()?;
//!     let store = InMemoryStore::new();
//!
//!     ServerBuilder::new(config)
//!         .with_store(store)
//!         .with_event_bus(1024)
//!         .serve()
//!         .await
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod entities;
pub mod orders;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy, AuthProvider, Caller, GatewayAuthProvider, NoAuthProvider},
        entity::Entity,
        error::{ShopError, ShopResult},
        events::{EventBus, EventEnvelope, OrderEvent},
        query::{Pagination, ProductFilter, ProductQuery},
        service::{CatalogStore, OrderStore, UserStore},
        stock::{AdjustmentKind, StockAdjustment, StockError, StockLedger, StockLine},
        validation::ValidatedJson,
    };

    // === Entities ===
    pub use crate::entities::{
        Category, LineItem, Order, OrderStatus, PaymentStatus, Product, Role, ShippingAddress,
        User,
    };

    // === Orders ===
    pub use crate::orders::{
        CancelOutcome, DiscountRule, NewLineItem, NewOrder, OrderService, Pricing, StatusChange,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::{AppConfig, Environment, Fixtures, StorageConfig};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
