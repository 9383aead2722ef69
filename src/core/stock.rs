//! Stock ledger: atomic, per-order stock adjustments
//!
//! Product stock is only ever changed through a [`StockLedger`]. A ledger
//! applies adjustments keyed by order id so that
//!
//! - a reservation is all-or-nothing across every line of the order,
//! - the check and the decrement of a line cannot interleave with another
//!   reservation on the same product,
//! - reserving or releasing the same order twice changes nothing the second time,
//! - every applied adjustment is kept in an audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// One product/quantity pair to reserve or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

impl StockLine {
    pub fn new(product_id: Uuid, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }

    /// Merge lines that reference the same product, summing their quantities
    ///
    /// The result is ordered by product id so that backends touch products in
    /// a stable order. Fails when a merged quantity does not fit in a `u32`.
    pub fn aggregate(lines: &[StockLine]) -> Result<Vec<StockLine>, StockError> {
        let mut merged: BTreeMap<Uuid, u32> = BTreeMap::new();
        for line in lines {
            let total = merged.entry(line.product_id).or_default();
            *total = total
                .checked_add(line.quantity)
                .ok_or(StockError::QuantityOverflow {
                    product_id: line.product_id,
                })?;
        }
        Ok(merged
            .into_iter()
            .map(|(product_id, quantity)| StockLine::new(product_id, quantity))
            .collect())
    }
}

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Stock taken for an order
    Reserve,
    /// Stock given back when an order is cancelled or deleted
    Release,
}

impl AdjustmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::Reserve => "reserve",
            AdjustmentKind::Release => "release",
        }
    }
}

/// A ledger entry: every line adjusted for one order in one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// `{order_id}:{kind}`, unique per order and direction
    pub id: String,
    pub order_id: Uuid,
    pub kind: AdjustmentKind,
    pub lines: Vec<StockLine>,
    #[serde(with = "crate::core::timestamp")]
    pub at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(order_id: Uuid, kind: AdjustmentKind, lines: Vec<StockLine>) -> Self {
        Self {
            id: Self::key(&order_id, kind),
            order_id,
            kind,
            lines,
            at: Utc::now(),
        }
    }

    pub fn key(order_id: &Uuid, kind: AdjustmentKind) -> String {
        format!("{}:{}", order_id, kind.as_str())
    }

    /// Expand into one signed adjustment per line
    pub fn adjustments(&self) -> Vec<StockAdjustment> {
        self.lines
            .iter()
            .map(|line| StockAdjustment {
                order_id: self.order_id,
                product_id: line.product_id,
                delta: match self.kind {
                    AdjustmentKind::Reserve => -i64::from(line.quantity),
                    AdjustmentKind::Release => i64::from(line.quantity),
                },
                kind: self.kind,
                at: self.at,
            })
            .collect()
    }
}

/// A single signed change to one product's stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub delta: i64,
    pub kind: AdjustmentKind,
    #[serde(with = "crate::core::timestamp")]
    pub at: DateTime<Utc>,
}

/// Errors raised by a stock ledger
#[derive(Debug, Error)]
pub enum StockError {
    #[error("product '{product_id}' not found")]
    ProductNotFound { product_id: Uuid },

    #[error("insufficient stock for {product_name}: requested {requested}, available {available}")]
    Insufficient {
        product_id: Uuid,
        product_name: String,
        requested: u32,
        available: u32,
    },

    #[error("quantity requested for product '{product_id}' is too large")]
    QuantityOverflow { product_id: Uuid },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Atomic stock adjustments keyed by order id
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Take stock for every line of an order, or for none of them
    ///
    /// Reserving an order that already holds a reservation is a no-op.
    async fn reserve(&self, order_id: &Uuid, lines: &[StockLine]) -> Result<(), StockError>;

    /// Give back exactly what was reserved for an order
    ///
    /// Returns `false` when nothing was applied: the order holds no
    /// reservation, or it was already released.
    async fn release(&self, order_id: &Uuid) -> Result<bool, StockError>;

    /// Audit trail of every adjustment applied for an order, oldest first
    async fn adjustments(&self, order_id: &Uuid) -> Result<Vec<StockAdjustment>, StockError>;
}
