//! Shared state handed to every HTTP handler
//!
//! The host holds the order service, read access to the catalog, the loaded
//! configuration and the identity resolver. It is cheap to clone: every
//! field is reference counted.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::auth::AuthProvider;
use crate::core::events::EventBus;
use crate::core::service::CatalogStore;
use crate::orders::service::OrderService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Order workflows (placement, status changes, cancellation)
    pub orders: Arc<OrderService>,

    /// Catalog reads for the public storefront routes
    pub catalog: Arc<dyn CatalogStore>,

    pub config: Arc<AppConfig>,

    /// Resolves the caller of every request
    pub auth: Arc<dyn AuthProvider>,

    /// Optional event bus; order mutations are published on it
    pub event_bus: Option<EventBus>,
}
