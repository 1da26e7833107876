//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product grid (filters + ?search=)
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /product/{id}           - Product detail
//! GET  /categories             - Category filter fragment (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/sidebar           - Cart sidebar (fragment)
//!
//! # Checkout
//! GET  /checkout               - Shipping step (redirects to /cart when empty)
//! POST /checkout/shipping      - Validate shipping, show payment step
//! POST /checkout/place         - Place order, redirect to confirmation
//! GET  /order-confirmation     - Confirmation (redirects to / without an order)
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod not_found;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/sidebar", get(cart::sidebar))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/place", post(checkout::place))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Product grid
        .route("/", get(home::home))
        // Catalog
        .route("/product/{id}", get(products::show))
        .route("/categories", get(home::categories))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .nest("/checkout", checkout_routes())
        .route("/order-confirmation", get(checkout::confirmation))
        .fallback(not_found::not_found)
}
