//! Bazaar Core - Catalog, cart and checkout logic.
//!
//! This crate provides the domain model and rules shared by every Bazaar
//! component:
//! - `storefront` - Server-rendered shop
//! - `cli` - Command-line shopping and catalog tools
//!
//! # Architecture
//!
//! The core crate performs no I/O of its own: persistence goes through the
//! [`cart::CartStorage`] trait and time is passed in by the caller. This keeps
//! it synchronous, deterministic and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Product, category, ID and price types
//! - [`filter`] - Catalog filtering and search
//! - [`cart`] - Cart store with write-through persistence
//! - [`checkout`] - Totals, shipping validation and order placement
//! - [`debounce`] - Clock-injected debouncing and the price range input

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod debounce;
pub mod filter;
pub mod types;

pub use cart::{Cart, CartError, CartLine, CartStorage, CartStore, MemoryStorage, StorageError};
pub use checkout::{
    Checkout, CheckoutError, CheckoutStep, FieldErrors, OrderConfirmation, OrderTotals,
    PaymentMethod, ShippingDetails, ShippingField,
};
pub use filter::{CategorySelection, FilterSpec};
pub use types::*;
