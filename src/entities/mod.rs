//! Stored documents: users, categories, products and orders

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::Category;
pub use order::{LineItem, Order, OrderStatus, PaymentStatus, ShippingAddress};
pub use product::{Product, Review};
pub use user::{Role, User, UserProfile};
