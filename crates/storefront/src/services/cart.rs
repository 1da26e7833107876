//! Shared cart for the storefront process.
//!
//! Wraps a single [`CartStore`] behind an async mutex and republishes its
//! change notifications as a `watch` channel carrying the item count, which
//! feeds the header badge.

use std::sync::Arc;

use bazaar_core::checkout::{self, CheckoutError};
use bazaar_core::{
    Cart, CartError, CartStorage, CartStore, OrderConfirmation, Product, ProductId,
    ShippingDetails,
};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tracing::instrument;

type DynStorage = Box<dyn CartStorage + Send>;

/// Handle to the shopper's cart. Cheap to clone.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    store: Mutex<CartStore<DynStorage>>,
    count: watch::Receiver<u32>,
}

impl CartService {
    /// Open the cart persisted in `storage`.
    pub fn new(storage: impl CartStorage + Send + 'static) -> Self {
        let mut store = CartStore::open(Box::new(storage) as DynStorage);

        let (tx, rx) = watch::channel(store.cart().item_count());
        store.subscribe(move |cart| {
            tx.send_replace(cart.item_count());
        });

        Self {
            inner: Arc::new(CartServiceInner {
                store: Mutex::new(store),
                count: rx,
            }),
        }
    }

    /// A copy of the current cart.
    pub async fn snapshot(&self) -> Cart {
        self.inner.store.lock().await.cart().clone()
    }

    /// Units in the cart, as last published.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        *self.inner.count.borrow()
    }

    /// Add units of `product`, returning the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<Cart, CartError> {
        let mut store = self.inner.store.lock().await;
        store.add(product, quantity)?;
        Ok(store.cart().clone())
    }

    /// Set a line's quantity (clamped to at least 1), returning the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let mut store = self.inner.store.lock().await;
        store.update_quantity(product_id, quantity)?;
        Ok(store.cart().clone())
    }

    /// Remove a line, returning the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let mut store = self.inner.store.lock().await;
        store.remove(product_id)?;
        Ok(store.cart().clone())
    }

    /// Place the order for the whole cart and empty it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or shipping is incomplete.
    #[instrument(skip(self, shipping))]
    pub async fn place_order(
        &self,
        shipping: &ShippingDetails,
        now: DateTime<Utc>,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let mut store = self.inner.store.lock().await;
        checkout::place_order(&mut *store, shipping, now)
    }
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("item_count", &self.item_count())
            .finish_non_exhaustive()
    }
}
