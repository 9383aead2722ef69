//! HTTP handlers for order operations
//!
//! Every handler takes the caller through the [`Caller`] extractor, so an
//! anonymous request is answered with `401` before its body is read.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::auth::Caller;
use crate::core::error::ShopResult;
use crate::core::validation::{ValidatedJson, parse_id};
use crate::entities::{OrderStatus, ShippingAddress};
use crate::orders::service::{CancelOutcome, NewLineItem, NewOrder, StatusChange};
use crate::server::host::AppState;

/// Request body for placing an order
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,

    /// Also accepted as `shippingAddress`
    #[serde(default, alias = "shippingAddress")]
    #[validate(nested)]
    pub address: Option<ShippingAddress>,

    #[serde(default)]
    #[validate(length(max = 64))]
    pub discount_code: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,

    /// Client-computed total. Never trusted.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    /// Also accepted as `_id`
    #[serde(alias = "_id")]
    pub product: Uuid,

    /// Defaults to 1
    #[serde(default)]
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: Option<u32>,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub size: Option<String>,

    #[serde(default)]
    #[validate(length(max = 40))]
    pub color: Option<String>,
}

impl PlaceOrderRequest {
    pub fn into_new_order(self) -> NewOrder {
        NewOrder {
            items: self
                .items
                .into_iter()
                .map(|item| NewLineItem {
                    product: item.product,
                    quantity: item.quantity.unwrap_or(1),
                    size: item.size,
                    color: item.color,
                })
                .collect(),
            shipping_address: self.address,
            discount_code: self.discount_code,
            notes: self.notes,
        }
    }
}

/// Request body for `PUT /orders/{id}`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,

    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
}

/// POST /orders (and /orders/place)
pub async fn place_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ValidatedJson(payload): ValidatedJson<PlaceOrderRequest>,
) -> ShopResult<impl IntoResponse> {
    if let Some(amount) = &payload.amount {
        tracing::warn!(
            user_id = ?caller.user_id(),
            amount = %amount,
            "ignoring client-supplied order amount"
        );
    }

    let order = state.orders.place(&caller, payload.into_new_order()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created successfully",
            "order": order,
        })),
    ))
}

/// GET /orders
pub async fn list_orders(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ShopResult<impl IntoResponse> {
    let orders = state.orders.list(&caller).await?;

    Ok(Json(json!({
        "success": true,
        "count": orders.len(),
        "orders": orders,
    })))
}

/// GET /orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ShopResult<impl IntoResponse> {
    let order = state.orders.get(&caller, &parse_id(&id)?).await?;

    Ok(Json(json!({
        "success": true,
        "order": order,
    })))
}

/// PUT /orders/{id}
pub async fn update_order_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderStatusRequest>,
) -> ShopResult<impl IntoResponse> {
    let change = StatusChange {
        status: payload.status,
        tracking_number: payload.tracking_number,
    };
    let order = state
        .orders
        .update_status(&caller, &parse_id(&id)?, change)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Order updated successfully",
        "order": order,
    })))
}

/// DELETE /orders/{id}
pub async fn cancel_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ShopResult<impl IntoResponse> {
    let body = match state.orders.cancel(&caller, &parse_id(&id)?).await? {
        CancelOutcome::Deleted { id } => json!({
            "success": true,
            "message": "Order deleted successfully",
            "id": id,
        }),
        CancelOutcome::Cancelled(order) => json!({
            "success": true,
            "message": "Order cancelled successfully",
            "order": order,
        }),
    };

    Ok(Json(body))
}

/// GET /orders/{id}/stock-adjustments
pub async fn list_stock_adjustments(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ShopResult<impl IntoResponse> {
    let adjustments = state
        .orders
        .stock_adjustments(&caller, &parse_id(&id)?)
        .await?;

    Ok(Json(json!({
        "success": true,
        "adjustments": adjustments,
    })))
}

/// POST /orders/stripe, /orders/razorpay, /orders/verifyRazorpay
///
/// Payment providers are not integrated.
pub async fn payment_not_implemented(Caller(_caller): Caller) -> impl IntoResponse {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({
            "success": false,
            "message": "Online payment is not available yet",
        })),
    )
}
