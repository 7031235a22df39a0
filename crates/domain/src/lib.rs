//! Domain layer for the smart-fridge simulation.
//!
//! This crate provides the plain values the fridge actors exchange:
//! - Product catalog with immutable product definitions
//! - Money amounts stored in cents
//! - Stock, the ordered multiset of products held by the fridge
//! - Order records appended to the order history on every restock

pub mod money;
pub mod order;
pub mod product;
pub mod stock;

pub use money::Money;
pub use order::{OrderId, OrderRecord};
pub use product::{CATALOG_NAMES, Product};
pub use stock::{Stock, StockError};
