//! Public storefront reads: products, categories and client configuration

pub mod handlers;
