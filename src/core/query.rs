//! Query parameters and pagination for catalog listings

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default page size for product listings
pub const DEFAULT_LIMIT: usize = 12;

/// Largest page a client may request
pub const MAX_LIMIT: usize = 100;

/// Query parameters accepted by `GET /products`
///
/// # Example
/// ```text
/// GET /products?page=2&limit=12
/// GET /products?category=<uuid>&featured=true
/// GET /products?search=linen
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Restrict to one category
    pub category: Option<Uuid>,

    /// Case-insensitive match on name or description
    pub search: Option<String>,

    /// Only featured products when `true`
    pub featured: Option<bool>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            category: None,
            search: None,
            featured: None,
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl ProductQuery {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Number of matches to skip for the requested page
    pub fn skip(&self) -> usize {
        (self.page() - 1) * self.limit()
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category,
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            featured_only: self.featured.unwrap_or(false),
        }
    }
}

/// Storage-level product filter; only active products are ever listed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub featured_only: bool,
}

/// Pagination metadata in the storefront's wire format
#[derive(Debug, Serialize, PartialEq)]
pub struct Pagination {
    /// Current page number (starts at 1)
    pub current: usize,

    /// Total number of pages
    pub pages: usize,

    /// Total number of matches
    pub total: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        Self {
            current: page,
            pages: total.div_ceil(limit),
            total,
        }
    }
}
