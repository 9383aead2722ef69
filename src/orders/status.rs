//! Order status transition table
//!
//! ```text
//! pending ──▶ confirmed ──▶ shipped ──▶ delivered
//!    │            │            │
//!    └────────────┴────────────┴──▶ cancelled
//! ```
//!
//! Re-asserting the current status is always accepted. `delivered` and
//! `cancelled` are terminal.

use crate::entities::OrderStatus;

impl OrderStatus {
    /// Statuses reachable from `self` in one step, excluding `self`
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;

        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Shipped, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next || self.allowed_transitions().contains(&next)
    }

    /// Whether the owner may still cancel an order in this status
    pub fn is_customer_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}
