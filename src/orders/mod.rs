//! Order placement, retrieval, status changes and cancellation

pub mod handlers;
pub mod pricing;
pub mod service;
pub mod status;

pub use pricing::{DiscountRule, Pricing, Totals};
pub use service::{CancelOutcome, NewLineItem, NewOrder, OrderService, StatusChange};
