//! Order workflows: placement, retrieval, status changes and cancellation
//!
//! Placing an order is a two-step saga:
//!
//! ```text
//! validate ─▶ price ─▶ ledger.reserve ─▶ orders.insert
//!                                             │ fails
//!                                             ▼
//!                                       ledger.release
//! ```
//!
//! Stock only ever moves through the [`StockLedger`], keyed by order id, so a
//! cancellation followed by a deletion (or any retried release) restores
//! stock once.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::AuthContext;
use crate::core::error::{ShopError, ShopResult};
use crate::core::events::{EventBus, OrderEvent};
use crate::core::service::{CatalogStore, OrderStore};
use crate::core::stock::{StockAdjustment, StockLedger, StockLine};
use crate::entities::{LineItem, Order, OrderStatus, Product, ShippingAddress};
use crate::orders::pricing::Pricing;

/// Largest quantity a single order line may request
pub const MAX_LINE_QUANTITY: u32 = 1_000;

/// One requested line, before prices are known
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub product: Uuid,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Everything needed to place an order on behalf of the caller
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub items: Vec<NewLineItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub discount_code: Option<String>,
    pub notes: Option<String>,
}

/// Admin change of an order's status
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

/// Result of `DELETE /orders/{id}`
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// Owner cancellation; the record is kept
    Cancelled(Order),
    /// Admin removal
    Deleted { id: Uuid },
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn StockLedger>,
    pricing: Pricing,
    events: Option<EventBus>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn StockLedger>,
        pricing: Pricing,
    ) -> Self {
        Self {
            orders,
            catalog,
            ledger,
            pricing,
            events: None,
        }
    }

    /// Publish lifecycle events on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    fn publish(&self, event: OrderEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Validate, price and persist a new order, reserving its stock
    ///
    /// No order is stored and no stock moves unless every line can be served.
    pub async fn place(&self, caller: &AuthContext, request: NewOrder) -> ShopResult<Order> {
        let user_id = caller.require_user()?;

        if request.items.is_empty() {
            return Err(ShopError::invalid_request("No items in order"));
        }
        let shipping_address = request
            .shipping_address
            .ok_or_else(|| ShopError::invalid_request("Shipping address is required"))?;
        if request.items.iter().any(|item| item.quantity == 0) {
            return Err(ShopError::invalid_request("Quantity must be at least 1"));
        }
        if request.items.iter().any(|item| item.quantity > MAX_LINE_QUANTITY) {
            return Err(ShopError::invalid_request(format!(
                "Quantity must be at most {}",
                MAX_LINE_QUANTITY
            )));
        }

        let products = self.resolve_products(&request.items).await?;

        let items: Vec<LineItem> = request
            .items
            .into_iter()
            .map(|item| LineItem {
                product: item.product,
                quantity: item.quantity,
                price: products[&item.product].price,
                size: item.size,
                color: item.color,
            })
            .collect();

        // Early, friendly rejection; the ledger re-checks atomically
        let lines: Vec<StockLine> = items.iter().map(LineItem::stock_line).collect();
        for line in StockLine::aggregate(&lines)? {
            let product = &products[&line.product_id];
            if product.stock < line.quantity {
                return Err(ShopError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
        }

        let totals = self
            .pricing
            .totals(&items, request.discount_code.as_deref())?;

        let mut order = Order::new(user_id, items, shipping_address);
        order.total_price = totals.total_price;
        order.discount_amount = totals.discount_amount;
        order.final_price = totals.final_price;
        order.notes = request.notes;

        self.ledger.reserve(&order.id, &lines).await?;

        let order = match self.orders.insert(order.clone()).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "failed to persist order, releasing stock");
                if let Err(release_err) = self.ledger.release(&order.id).await {
                    tracing::error!(
                        order_id = %order.id,
                        error = %release_err,
                        "failed to release stock of unpersisted order"
                    );
                }
                return Err(ShopError::internal(format!("Failed to create order: {}", e)));
            }
        };

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            items = order.items.len(),
            final_price = order.final_price,
            "order placed"
        );
        self.publish(OrderEvent::Placed {
            order_id: order.id,
            user_id,
            final_price: order.final_price,
        });

        Ok(order)
    }

    /// Fetch every distinct product referenced by `items`
    ///
    /// Missing and inactive products are both reported as not found.
    async fn resolve_products(&self, items: &[NewLineItem]) -> ShopResult<HashMap<Uuid, Product>> {
        let mut products = HashMap::new();
        for item in items {
            if products.contains_key(&item.product) {
                continue;
            }
            let product = self
                .catalog
                .get_product(&item.product)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| ShopError::not_found("product", item.product))?;
            products.insert(product.id, product);
        }
        Ok(products)
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Every order for admins, the caller's own orders otherwise; newest first
    pub async fn list(&self, caller: &AuthContext) -> ShopResult<Vec<Order>> {
        let user_id = caller.require_user()?;
        let owner = (!caller.is_admin()).then_some(user_id);
        Ok(self.orders.list(owner.as_ref()).await?)
    }

    pub async fn get(&self, caller: &AuthContext, id: &Uuid) -> ShopResult<Order> {
        caller.require_user()?;
        let order = self.find(id).await?;

        if !caller.can_access(&order.user) {
            return Err(ShopError::forbidden("Not authorized to view this order"));
        }
        Ok(order)
    }

    async fn find(&self, id: &Uuid) -> ShopResult<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| ShopError::not_found("order", id))
    }

    // =========================================================================
    // Status changes
    // =========================================================================

    /// Move an order to another status (admin only)
    ///
    /// Moving to `cancelled` gives the order's stock back.
    pub async fn update_status(
        &self,
        caller: &AuthContext,
        id: &Uuid,
        change: StatusChange,
    ) -> ShopResult<Order> {
        caller.require_admin("update orders")?;
        let mut order = self.find(id).await?;
        let from = order.status;

        if !from.can_transition_to(change.status) {
            return Err(ShopError::InvalidState {
                current: from.to_string(),
                requested: change.status.to_string(),
                message: format!(
                    "Cannot change order status from {} to {}",
                    from, change.status
                ),
            });
        }

        if change.status == OrderStatus::Cancelled && from != OrderStatus::Cancelled {
            self.release_stock(&order).await?;
        }

        order.status = change.status;
        if let Some(tracking_number) = change.tracking_number {
            order.tracking_number = Some(tracking_number);
        }
        order.touch();
        let order = self.orders.update(order).await?;

        if from != order.status {
            tracing::info!(order_id = %order.id, from = %from, to = %order.status, "order status changed");
            self.publish(OrderEvent::StatusChanged {
                order_id: order.id,
                from,
                to: order.status,
            });
            if order.status == OrderStatus::Cancelled {
                self.publish(OrderEvent::Cancelled {
                    order_id: order.id,
                    by_admin: true,
                });
            }
        }

        Ok(order)
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Delete (admin) or cancel (owner) an order, restoring its stock
    pub async fn cancel(&self, caller: &AuthContext, id: &Uuid) -> ShopResult<CancelOutcome> {
        caller.require_user()?;
        let mut order = self.find(id).await?;

        if caller.is_admin() {
            if order.status != OrderStatus::Cancelled {
                self.release_stock(&order).await?;
            }
            self.orders.delete(&order.id).await?;

            tracing::info!(order_id = %order.id, status = %order.status, "order deleted");
            self.publish(OrderEvent::Deleted { order_id: order.id });
            return Ok(CancelOutcome::Deleted { id: order.id });
        }

        if !caller.can_access(&order.user) {
            return Err(ShopError::forbidden("Not authorized to cancel this order"));
        }
        if !order.status.is_customer_cancellable() {
            return Err(ShopError::InvalidState {
                current: order.status.to_string(),
                requested: OrderStatus::Cancelled.to_string(),
                message: "Cannot cancel order with this status".to_string(),
            });
        }

        self.release_stock(&order).await?;
        order.status = OrderStatus::Cancelled;
        order.touch();
        let order = self.orders.update(order).await?;

        tracing::info!(order_id = %order.id, "order cancelled by owner");
        self.publish(OrderEvent::Cancelled {
            order_id: order.id,
            by_admin: false,
        });
        Ok(CancelOutcome::Cancelled(order))
    }

    async fn release_stock(&self, order: &Order) -> ShopResult<()> {
        if !self.ledger.release(&order.id).await? {
            tracing::debug!(order_id = %order.id, "no reserved stock to release");
        }
        Ok(())
    }

    /// Stock audit trail of one order (admin only)
    pub async fn stock_adjustments(
        &self,
        caller: &AuthContext,
        id: &Uuid,
    ) -> ShopResult<Vec<StockAdjustment>> {
        caller.require_admin("view stock adjustments")?;
        let order = self.find(id).await?;
        Ok(self.ledger.adjustments(&order.id).await?)
    }
}
