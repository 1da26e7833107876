//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod category;
pub mod id;
pub mod price;
pub mod product;

pub use category::Category;
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::Product;
