//! Orders, line items and the order lifecycle enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::core::stock::StockLine;

/// Lifecycle stage of an order
///
/// The legal edges between stages live in [`crate::orders::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state; payment processing itself is not implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Denormalized snapshot of where an order ships
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
}

/// One product/quantity entry of an order, priced at submission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product: Uuid,
    pub quantity: u32,
    /// Unit price snapshot; later catalog price changes do not affect it
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    pub fn stock_line(&self) -> StockLine {
        StockLine::new(self.product, self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    /// Owning user
    pub user: Uuid,
    pub items: Vec<LineItem>,
    pub total_price: f64,
    #[serde(default)]
    pub discount_amount: f64,
    pub final_price: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(with = "crate::core::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::core::timestamp")]
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(Order, "order", "orders");

impl Order {
    /// A new `pending` order with totals left at zero
    pub fn new(user: Uuid, items: Vec<LineItem>, shipping_address: ShippingAddress) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user,
            items,
            total_price: 0.0,
            discount_amount: 0.0,
            final_price: 0.0,
            status: OrderStatus::Pending,
            shipping_address,
            notes: None,
            payment_status: PaymentStatus::Pending,
            tracking_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        &self.user == user_id
    }

    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.items.iter().map(LineItem::stock_line).collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
