//! Storefront
//!
//! Storefront is the client-side core of an online shop: product pricing with
//! bulk-discount tiers, a persistent cart with change notification, product
//! photo normalisation, and the payload that hands a cart to a payment
//! gateway.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod discounts;
pub mod observability;
pub mod photos;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod session;
pub mod storage;
pub mod variants;
