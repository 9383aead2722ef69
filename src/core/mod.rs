//! Core module containing the fundamental traits and types of the order service

pub mod auth;
pub mod entity;
pub mod error;
pub mod events;
pub mod query;
pub mod service;
pub mod stock;
pub mod timestamp;
pub mod validation;

pub use auth::{AuthContext, AuthPolicy, AuthProvider, Caller, GatewayAuthProvider, NoAuthProvider};
pub use entity::Entity;
pub use error::{ErrorResponse, FieldError, RequestError, ShopError, ShopResult};
pub use events::{EventBus, EventEnvelope, OrderEvent};
pub use query::{Pagination, ProductFilter, ProductQuery};
pub use service::{CatalogStore, OrderStore, UserStore};
pub use stock::{AdjustmentKind, LedgerEntry, StockAdjustment, StockError, StockLedger, StockLine};
pub use validation::ValidatedJson;
