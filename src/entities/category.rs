//! Product categories

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    /// Unique across categories
    pub name: String,
    /// Derived from `name`
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "crate::core::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::core::timestamp")]
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(Category, "category", "categories");

fn default_true() -> bool {
    true
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            description: None,
            image: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lowercase `name` and collapse every run of non-alphanumerics into `-`
pub fn slugify(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lower = name.trim().to_lowercase();
    separators
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}
