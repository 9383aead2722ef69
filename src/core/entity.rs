//! Entity trait shared by every stored document

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored document: users, categories, products and orders.
///
/// Storage backends use [`Entity::resource_name`] as the collection name and
/// [`Entity::resource_name_singular`] in error messages.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name used for collections and URLs (e.g., "orders")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "order")
    fn resource_name_singular() -> &'static str;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;
}

/// Implement [`Entity`] for a struct with `id`, `created_at` and `updated_at` fields
#[macro_export]
macro_rules! impl_entity {
    ($type:ty, $singular:expr, $plural:expr) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }
        }
    };
}
