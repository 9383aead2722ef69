//! Server-side order totals
//!
//! Prices always come from the catalog snapshot taken when the order is
//! placed. The only way to lower a total is a discount code known to the
//! server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::{ShopError, ShopResult};
use crate::entities::LineItem;

/// A discount attached to a code in the configuration
///
/// ```yaml
/// discount_codes:
///   WELCOME10: { percent: 10 }
///   FIVEOFF: { amount: 5 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountRule {
    /// Percentage of the total, between 0 and 100
    Percent(f64),
    /// Fixed amount off the total
    Amount(f64),
}

impl DiscountRule {
    /// Discount granted on `total`, never more than `total` itself
    pub fn discount_on(&self, total: f64) -> f64 {
        let raw = match *self {
            DiscountRule::Percent(percent) => total * percent.clamp(0.0, 100.0) / 100.0,
            DiscountRule::Amount(amount) => amount.max(0.0),
        };
        round_cents(raw.min(total))
    }
}

/// Computed money fields of an order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub total_price: f64,
    pub discount_amount: f64,
    pub final_price: f64,
}

/// Computes order totals from line items and discount codes
#[derive(Debug, Clone, Default)]
pub struct Pricing {
    codes: HashMap<String, DiscountRule>,
}

impl Pricing {
    pub fn new(codes: &HashMap<String, DiscountRule>) -> Self {
        Self {
            codes: codes
                .iter()
                .map(|(code, rule)| (normalize_code(code), *rule))
                .collect(),
        }
    }

    /// Look up a discount code, ignoring case and surrounding whitespace
    pub fn rule(&self, code: &str) -> Option<DiscountRule> {
        self.codes.get(&normalize_code(code)).copied()
    }

    /// Compute totals for `items`, applying `discount_code` if given
    ///
    /// Fails with `InvalidRequest` for an unknown code.
    pub fn totals(&self, items: &[LineItem], discount_code: Option<&str>) -> ShopResult<Totals> {
        let total_price = round_cents(items.iter().map(LineItem::subtotal).sum());

        let discount_amount = match discount_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => self
                .rule(code)
                .ok_or_else(|| ShopError::invalid_request(format!("Unknown discount code '{}'", code)))?
                .discount_on(total_price),
            None => 0.0,
        };

        Ok(Totals {
            total_price,
            discount_amount,
            final_price: round_cents((total_price - discount_amount).max(0.0)),
        })
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
