//! HTTP handlers for the public catalog

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde_json::json;

use crate::core::error::{ShopError, ShopResult};
use crate::core::query::{Pagination, ProductQuery};
use crate::core::validation::parse_id;
use crate::server::host::AppState;

/// GET /config
pub async fn get_app_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;

    Json(json!({
        "success": true,
        "currency": {
            "code": config.currency.code,
            "symbol": config.currency.symbol,
            "name": config.currency.name,
        },
        "deliveryFee": config.delivery_fee,
        "appName": config.app_name,
        "version": config.version,
    }))
}

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ShopResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ShopError::invalid_request(e.body_text()))?;

    let (products, total) = state
        .catalog
        .list_products(&query.filter(), query.skip(), query.limit())
        .await?;

    Ok(Json(json!({
        "success": true,
        "products": products,
        "pagination": Pagination::new(query.page(), query.limit(), total),
    })))
}

/// GET /products/{id}
///
/// Inactive products are hidden from the storefront.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ShopResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let product = state
        .catalog
        .get_product(&id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ShopError::not_found("product", id))?;

    Ok(Json(json!({
        "success": true,
        "product": product,
    })))
}

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> ShopResult<impl IntoResponse> {
    let categories = state.catalog.list_categories().await?;

    Ok(Json(json!({
        "success": true,
        "count": categories.len(),
        "categories": categories,
    })))
}

/// GET /categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ShopResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let category = state
        .catalog
        .get_category(&id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ShopError::not_found("category", id))?;

    Ok(Json(json!({
        "success": true,
        "category": category,
    })))
}
