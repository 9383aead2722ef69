//! Catalog products

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer review embedded in its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// 1 to 5
    pub rating: u8,
    #[serde(with = "crate::core::timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    pub category: Uuid,
    /// Primary image reference
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Units available; only the stock ledger changes it
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "crate::core::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::core::timestamp")]
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(Product, "product", "products");

fn default_true() -> bool {
    true
}

impl Product {
    /// An active product with the given price and stock
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: Uuid,
        image: impl Into<String>,
        stock: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            price,
            discount_price: None,
            category,
            image: image.into(),
            images: Vec::new(),
            stock,
            sizes: Vec::new(),
            colors: Vec::new(),
            rating: 0.0,
            reviews: Vec::new(),
            is_featured: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `query` appears in the name or description, ignoring case
    pub fn matches_search(&self, query: &regex::Regex) -> bool {
        query.is_match(&self.name) || query.is_match(&self.description)
    }
}

/// Case-insensitive literal matcher for catalog search terms
pub fn search_pattern(term: &str) -> Result<regex::Regex, regex::Error> {
    regex::RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
}
