//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - The shopper's cart, shared across handlers

pub mod cart;

pub use cart::CartService;
