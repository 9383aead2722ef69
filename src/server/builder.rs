//! ServerBuilder for fluent API to build the HTTP server

use super::host::AppState;
use super::router::{build_catalog_routes, build_order_routes, health_routes};
use crate::config::AppConfig;
use crate::core::auth::{AuthProvider, GatewayAuthProvider};
use crate::core::error::expose_internal_details;
use crate::core::events::EventBus;
use crate::core::service::{CatalogStore, OrderStore, UserStore};
use crate::core::stock::StockLedger;
use crate::orders::pricing::Pricing;
use crate::orders::service::OrderService;
use anyhow::{Result, anyhow};
use axum::Router;
use axum::http::HeaderValue;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the order service's HTTP server
///
/// # Example
///
/// ```ignore
/// let store = InMemoryStore::new();
/// let app = ServerBuilder::new(AppConfig::default())
///     .with_store(store)
///     .with_event_bus(1024)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    orders: Option<Arc<dyn OrderStore>>,
    catalog: Option<Arc<dyn CatalogStore>>,
    users: Option<Arc<dyn UserStore>>,
    ledger: Option<Arc<dyn StockLedger>>,
    auth: Option<Arc<dyn AuthProvider>>,
    custom_routes: Vec<Router>,
    event_bus: Option<EventBus>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            orders: None,
            catalog: None,
            users: None,
            ledger: None,
            auth: None,
            custom_routes: Vec::new(),
            event_bus: None,
        }
    }

    /// Use one backend for orders, the catalog, users and the stock ledger
    pub fn with_store<S>(mut self, store: S) -> Self
    where
        S: OrderStore + CatalogStore + UserStore + StockLedger + Clone + 'static,
    {
        self.orders = Some(Arc::new(store.clone()));
        self.catalog = Some(Arc::new(store.clone()));
        self.users = Some(Arc::new(store.clone()));
        self.ledger = Some(Arc::new(store));
        self
    }

    pub fn with_order_store(mut self, store: Arc<dyn OrderStore>) -> Self {
        self.orders = Some(store);
        self
    }

    /// Replace the identity resolver
    ///
    /// Defaults to a [`GatewayAuthProvider`] over the configured user store.
    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(provider));
        self
    }

    /// Add custom routes to the server
    ///
    /// Use this for routes outside the order service, such as webhooks or
    /// admin tooling. Custom routes do not go through the identity resolver.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Enable the event bus for order lifecycle events
    ///
    /// # Arguments
    ///
    /// * `capacity` - Buffer size for the broadcast channel (recommended: 1024)
    pub fn with_event_bus(mut self, capacity: usize) -> Self {
        self.event_bus = Some(EventBus::new(capacity));
        self
    }

    /// Get the event bus, if enabled, to subscribe before serving
    pub fn event_bus(&self) -> Option<&EventBus> {
        self.event_bus.as_ref()
    }

    /// Build the shared handler state
    pub fn build_state(&self) -> Result<AppState> {
        let orders = self
            .orders
            .clone()
            .ok_or_else(|| anyhow!("An order store is required. Call .with_store()"))?;
        let catalog = self
            .catalog
            .clone()
            .ok_or_else(|| anyhow!("A catalog store is required. Call .with_store()"))?;
        let ledger = self
            .ledger
            .clone()
            .ok_or_else(|| anyhow!("A stock ledger is required. Call .with_store()"))?;

        let auth = match (&self.auth, &self.users) {
            (Some(auth), _) => auth.clone(),
            (None, Some(users)) => Arc::new(GatewayAuthProvider::new(users.clone())),
            (None, None) => {
                return Err(anyhow!(
                    "A user store or an auth provider is required. Call .with_store()"
                ));
            }
        };

        let mut service = OrderService::new(
            orders,
            catalog.clone(),
            ledger,
            Pricing::new(&self.config.discount_codes),
        );
        if let Some(bus) = &self.event_bus {
            service = service.with_event_bus(bus.clone());
        }

        Ok(AppState {
            orders: Arc::new(service),
            catalog,
            config: Arc::new(self.config.clone()),
            auth,
            event_bus: self.event_bus.clone(),
        })
    }

    /// Build the final router
    ///
    /// This generates health, catalog and order routes, merges custom
    /// routes, and wraps everything in request tracing and CORS.
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;
        expose_internal_details(self.config.is_development());

        let mut app = health_routes(&self.config.app_name)
            .merge(build_catalog_routes(state.clone()))
            .merge(build_order_routes(state));

        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        Ok(app
            .layer(self.cors_layer()?)
            .layer(TraceLayer::new_for_http()))
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let origins = &self.config.cors.allowed_origins;
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if origins.is_empty() {
            return Ok(layer.allow_origin(Any));
        }

        let origins = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| anyhow!("Invalid CORS origin '{}': {}", origin, e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(layer.allow_origin(origins))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the configured address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, starting graceful shutdown...");
        },
    }
}
