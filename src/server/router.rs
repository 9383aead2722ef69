//! Route table
//!
//! - GET /health, /healthz - liveness
//! - GET /config - storefront configuration
//! - GET /products, /products/{id}, /categories, /categories/{id} - public catalog
//! - POST /orders (alias /orders/place), GET /orders - place / list
//! - GET, PUT, DELETE /orders/{id} - read / change status / cancel or delete
//! - GET /orders/{id}/stock-adjustments - stock audit trail (admin)
//! - POST /orders/stripe, /orders/razorpay, /orders/verifyRazorpay - 501

use axum::{
    Json, Router,
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::catalog::handlers as catalog;
use crate::core::auth::resolve_caller;
use crate::orders::handlers as orders;
use crate::server::host::AppState;

/// Build order routes; every request goes through the identity resolver
pub fn build_order_routes(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(orders::place_order).get(orders::list_orders))
        .route("/orders/place", post(orders::place_order))
        .route("/orders/stripe", post(orders::payment_not_implemented))
        .route("/orders/razorpay", post(orders::payment_not_implemented))
        .route("/orders/verifyRazorpay", post(orders::payment_not_implemented))
        .route(
            "/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order_status)
                .delete(orders::cancel_order),
        )
        .route(
            "/orders/{id}/stock-adjustments",
            get(orders::list_stock_adjustments),
        )
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            resolve_caller,
        ))
        .with_state(state)
}

/// Build public catalog routes
pub fn build_catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/config", get(catalog::get_app_config))
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{id}", get(catalog::get_category))
        .with_state(state)
}

/// Build health check routes
pub fn health_routes(service: &str) -> Router {
    let body = json!({
        "status": "ok",
        "service": service,
    });
    let health = move || {
        let body = body.clone();
        async move { Json::<Value>(body) }
    };

    Router::new()
        .route("/health", get(health.clone()))
        .route("/healthz", get(health))
}
