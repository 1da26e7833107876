//! Shopping cart state with write-through persistence.
//!
//! [`CartStore`] owns the cart, keeps at most one [`CartLine`] per product,
//! and re-serializes the whole cart to a [`CartStorage`] backend after every
//! mutation. Subscribers registered with [`CartStore::subscribe`] observe the
//! cart after each change (header badge, sidebar).
//!
//! Persisted payloads are a JSON array of lines, each line being the product
//! snapshot flattened together with its `quantity`.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::checkout::OrderTotals;
use crate::types::{Product, ProductId};

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "bazaar_cart";

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key is not usable by this backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Errors raised while persisting the cart.
///
/// These never undo the in-memory change that triggered the write.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart could not be serialized.
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The storage backend rejected the write.
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
}

/// Durable string storage keyed by name.
pub trait CartStorage {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: CartStorage + ?Sized> CartStorage for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).store(key, value)
    }
}

/// Volatile storage for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create storage pre-populated with a single entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self { entries }
    }

    /// Peek at a raw stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One product and its quantity within the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Identifier of the product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// `price × quantity` using the snapshotted price, saturating at the
    /// bounds of `Decimal`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// The set of cart lines, in the order products were first added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Build a cart from raw lines, merging duplicates and clamping quantities.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            let quantity = line.quantity.max(1);
            match cart.position(line.product_id()) {
                Some(index) => {
                    if let Some(existing) = cart.lines.get_mut(index) {
                        existing.quantity = existing.quantity.saturating_add(quantity);
                    }
                }
                None => cart.lines.push(CartLine {
                    product: line.product,
                    quantity,
                }),
            }
        }
        cart
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == product_id)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Subtotal, tax and grand total for checkout.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_subtotal(self.total())
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id() == product_id)
    }
}

type Listener = Box<dyn Fn(&Cart) + Send + Sync>;

/// Owner of the active cart.
///
/// Every mutating call applies the change in memory, writes the full cart to
/// storage, then notifies subscribers. A persistence failure is returned to the
/// caller but the in-memory change stands.
pub struct CartStore<S> {
    cart: Cart,
    storage: S,
    listeners: Vec<Listener>,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the store, rehydrating any previously persisted cart.
    ///
    /// A missing, unreadable or malformed payload yields an empty cart.
    pub fn open(storage: S) -> Self {
        let cart = match storage.load(CART_STORAGE_KEY) {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<CartLine>>(&payload) {
                Ok(lines) => {
                    let cart = Cart::from_lines(lines);
                    debug!(lines = cart.len(), "Rehydrated persisted cart");
                    cart
                }
                Err(e) => {
                    warn!(error = %e, "Discarding malformed persisted cart");
                    Cart::default()
                }
            },
            Ok(None) => Cart::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                Cart::default()
            }
        };

        Self {
            cart,
            storage,
            listeners: Vec::new(),
        }
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning its storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Register a callback invoked with the cart after every mutation.
    pub fn subscribe(&mut self, listener: impl Fn(&Cart) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line is incremented; otherwise a new line is created with a
    /// snapshot of the product. A quantity of zero counts as one.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart could not be persisted.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let quantity = quantity.max(1);
        match self.cart.position(product.id) {
            Some(index) => {
                if let Some(line) = self.cart.lines.get_mut(index) {
                    line.quantity = line.quantity.saturating_add(quantity);
                }
            }
            None => self.cart.lines.push(CartLine {
                product: product.clone(),
                quantity,
            }),
        }
        debug!(product_id = %product.id, quantity, "Added to cart");
        self.commit()
    }

    /// Set the quantity of an existing line, clamped to at least 1.
    ///
    /// Never removes a line. Returns `Ok(false)` without persisting when the
    /// product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart could not be persisted.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool, CartError> {
        let Some(index) = self.cart.position(product_id) else {
            return Ok(false);
        };

        let clamped = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        if let Some(line) = self.cart.lines.get_mut(index) {
            line.quantity = clamped;
        }
        debug!(%product_id, quantity = clamped, "Updated cart quantity");
        self.commit().map(|()| true)
    }

    /// Remove a line. Returns `Ok(false)` when the product was not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart could not be persisted.
    pub fn remove(&mut self, product_id: ProductId) -> Result<bool, CartError> {
        let Some(index) = self.cart.position(product_id) else {
            return Ok(false);
        };

        self.cart.lines.remove(index);
        debug!(%product_id, "Removed from cart");
        self.commit().map(|()| true)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty cart could not be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.cart.lines.clear();
        debug!("Cleared cart");
        self.commit()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Persist, then notify. Listeners run even when the write fails.
    fn commit(&mut self) -> Result<(), CartError> {
        let result = self.persist();
        for listener in &self.listeners {
            listener(&self.cart);
        }
        result
    }

    fn persist(&mut self) -> Result<(), CartError> {
        let payload = serde_json::to_string(&self.cart)?;
        self.storage.store(CART_STORAGE_KEY, &payload)?;
        Ok(())
    }
}

impl<S> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use proptest::prelude::*;

    use super::*;
    use crate::types::product::tests_support::sample;

    fn priced(id: i32, price: i64) -> Product {
        let mut product = sample(ProductId::new(id));
        product.price = Decimal::new(price, 0);
        product
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::open(MemoryStorage::default())
    }

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn store(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_add_creates_then_increments() {
        let mut store = store();
        let product = priced(1, 250);

        store.add(&product, 1).unwrap();
        store.add(&product, 2).unwrap();

        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart().get(product.id).unwrap().quantity, 3);
    }

    #[test]
    fn test_add_zero_counts_as_one() {
        let mut store = store();
        store.add(&priced(1, 10), 0).unwrap();
        assert_eq!(store.cart().item_count(), 1);
    }

    #[test]
    fn test_update_quantity_clamps_and_never_removes() {
        let mut store = store();
        let product = priced(1, 250);
        store.add(&product, 4).unwrap();

        assert!(store.update_quantity(product.id, 0).unwrap());
        assert_eq!(store.cart().get(product.id).unwrap().quantity, 1);

        assert!(store.update_quantity(product.id, -5).unwrap());
        assert_eq!(store.cart().get(product.id).unwrap().quantity, 1);

        assert!(store.update_quantity(product.id, 7).unwrap());
        assert_eq!(store.cart().get(product.id).unwrap().quantity, 7);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = store();
        assert!(!store.update_quantity(ProductId::new(9), 3).unwrap());
        assert!(store.cart().is_empty());
        assert!(store.storage().get(CART_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_remove_then_add_starts_fresh() {
        let mut store = store();
        let product = priced(1, 250);
        store.add(&product, 5).unwrap();

        assert!(store.remove(product.id).unwrap());
        assert!(!store.remove(product.id).unwrap());

        store.add(&product, 2).unwrap();
        assert_eq!(store.cart().get(product.id).unwrap().quantity, 2);
    }

    #[test]
    fn test_total_saturates_instead_of_overflowing() {
        let mut store = store();
        let mut product = sample(ProductId::new(1));
        product.price = Decimal::MAX;
        store.add(&product, 2).unwrap();
        store.add(&priced(2, 10), 1).unwrap();

        assert_eq!(store.cart().total(), Decimal::MAX);
        assert_eq!(store.cart().totals().total, Decimal::MAX);
    }

    #[test]
    fn test_total_uses_snapshotted_prices() {
        let mut store = store();
        let mut product = priced(1, 250);
        store.add(&product, 2).unwrap();
        store.add(&priced(2, 100), 1).unwrap();

        // A later price change in the catalog does not reprice existing lines.
        product.price = Decimal::new(999, 0);
        store.add(&product, 1).unwrap();

        assert_eq!(store.total(), Decimal::new(850, 0));
        assert_eq!(store.cart().item_count(), 4);
    }

    #[test]
    fn test_persist_then_rehydrate_round_trip() {
        let mut store = store();
        store.add(&priced(1, 250), 2).unwrap();
        store.add(&priced(7, 1299), 1).unwrap();
        store.update_quantity(ProductId::new(7), 3).unwrap();

        let before = store.cart().clone();
        let reopened = CartStore::open(store.into_storage());

        assert_eq!(reopened.cart(), &before);
        let lines: Vec<_> = reopened
            .cart()
            .lines()
            .iter()
            .map(|line| (line.product_id().as_i32(), line.quantity))
            .collect();
        assert_eq!(lines, vec![(1, 2), (7, 3)]);
    }

    #[test]
    fn test_clear_persists_empty_cart() {
        let mut store = store();
        store.add(&priced(1, 250), 1).unwrap();
        store.clear().unwrap();

        assert!(store.cart().is_empty());
        assert_eq!(store.storage().get(CART_STORAGE_KEY), Some("[]"));
    }

    #[test]
    fn test_malformed_payload_falls_back_to_empty() {
        let storage = MemoryStorage::with_entry(CART_STORAGE_KEY, "{not json");
        let store = CartStore::open(storage);
        assert!(store.cart().is_empty());

        let storage = MemoryStorage::with_entry(CART_STORAGE_KEY, r#"{"lines": 3}"#);
        assert!(CartStore::open(storage).cart().is_empty());
    }

    #[test]
    fn test_rehydrate_merges_duplicates_and_clamps() {
        let line = |quantity| CartLine {
            product: priced(1, 10),
            quantity,
        };
        let payload = serde_json::to_string(&vec![line(2), line(0)]).unwrap();

        let store = CartStore::open(MemoryStorage::with_entry(CART_STORAGE_KEY, &payload));
        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart().item_count(), 3);
    }

    #[test]
    fn test_persisted_line_flattens_product() {
        let mut store = store();
        store.add(&priced(1, 250), 2).unwrap();

        let raw = store.storage().get(CART_STORAGE_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value[0]["Id"], 1);
        assert_eq!(value[0]["quantity"], 2);
    }

    #[test]
    fn test_subscribers_see_every_mutation() {
        let mut store = store();
        let seen = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&seen);
        store.subscribe(move |cart| sink.store(cart.item_count(), Ordering::SeqCst));

        let product = priced(1, 250);
        store.add(&product, 2).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        store.update_quantity(product.id, 5).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 5);

        store.clear().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_write_failure_keeps_in_memory_change() {
        let mut store = CartStore::open(BrokenStorage);
        let result = store.add(&priced(1, 250), 1);

        assert!(matches!(result, Err(CartError::Storage(_))));
        assert_eq!(store.cart().item_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_repeated_adds_sum(q1 in 1u32..10_000, q2 in 1u32..10_000) {
            let product = priced(1, 250);

            let mut forward = store();
            forward.add(&product, q1).unwrap();
            forward.add(&product, q2).unwrap();

            let mut reverse = store();
            reverse.add(&product, q2).unwrap();
            reverse.add(&product, q1).unwrap();

            prop_assert_eq!(forward.cart().get(product.id).unwrap().quantity, q1 + q2);
            prop_assert_eq!(forward.cart(), reverse.cart());
        }

        #[test]
        fn prop_update_never_drops_below_one(quantity in i64::MIN..=1_000_000i64) {
            let product = priced(1, 250);
            let mut store = store();
            store.add(&product, 3).unwrap();
            store.update_quantity(product.id, quantity).unwrap();

            let line = store.cart().get(product.id).unwrap();
            prop_assert!(line.quantity >= 1);
            if quantity >= 1 {
                prop_assert_eq!(i64::from(line.quantity), quantity);
            }
        }
    }
}
