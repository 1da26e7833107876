//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation answers with an `HX-Trigger: cart-updated` header so the
//! header badge and sidebar refresh themselves.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use bazaar_core::{Cart, CartLine, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Event fired on the client after any cart change.
pub const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i32,
    pub title: String,
    pub brand: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Unit count for the subtotal label.
    #[must_use]
    pub fn items_label(&self) -> String {
        match self.item_count {
            1 => "1 item".to_string(),
            n => format!("{n} items"),
        }
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.product_id().as_i32(),
            title: line.product.title.clone(),
            brand: line.product.brand.clone(),
            image: line.product.primary_image().unwrap_or_default().to_string(),
            quantity: line.quantity,
            price: line.product.selling_price().display(),
            line_price: bazaar_core::Price::inr(line.line_total()).display(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let totals = cart.totals();
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            subtotal: totals.subtotal_price().display(),
            tax: totals.tax_price().display(),
            total: totals.total_price().display(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Cart sidebar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_sidebar.html")]
pub struct CartSidebarTemplate {
    pub cart: CartView,
}

/// Display cart page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    let cart = state.cart().snapshot().await;
    CartShowTemplate {
        cart: CartView::from(&cart),
    }
}

/// Add item to cart (HTMX).
///
/// Looks the product up in the catalog so the cart line snapshots current
/// catalog data. Returns the count badge with an HTMX trigger.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let product = state
        .catalog()
        .get_by_id(ProductId::new(form.product_id))
        .await?;

    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.title
        )));
    }

    let quantity = form.quantity.unwrap_or(1);
    let cart = state.cart().add(&product, quantity).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", product.id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    ))
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<UpdateCartForm>,
) -> Result<impl IntoResponse> {
    let cart = state
        .cart()
        .update_quantity(ProductId::new(form.product_id), form.quantity)
        .await?;

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Remove item from cart (HTMX).
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<impl IntoResponse> {
    let cart = state
        .cart()
        .remove(ProductId::new(form.product_id))
        .await?;

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Get cart count badge (HTMX).
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> impl IntoResponse {
    CartCountTemplate {
        count: state.cart().item_count(),
    }
}

/// Get cart sidebar (HTMX).
#[instrument(skip(state))]
pub async fn sidebar(State(state): State<AppState>) -> impl IntoResponse {
    let cart = state.cart().snapshot().await;
    CartSidebarTemplate {
        cart: CartView::from(&cart),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::types::product::tests_support::sample;
    use bazaar_core::{CartStore, MemoryStorage};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let mut store = CartStore::open(MemoryStorage::default());
        let mut product = sample(ProductId::new(7));
        product.price = Decimal::new(250, 0);
        store.add(&product, 1).unwrap();

        let view = CartView::from(store.cart());
        assert_eq!(view.item_count, 1);
        assert_eq!(view.items_label(), "1 item");
        assert_eq!(view.subtotal, "₹250");
        assert_eq!(view.tax, "₹45");
        assert_eq!(view.total, "₹295");
    }

    #[test]
    fn test_line_price_uses_quantity() {
        let mut store = CartStore::open(MemoryStorage::default());
        let mut product = sample(ProductId::new(1));
        product.price = Decimal::new(129_950, 2);
        store.add(&product, 2).unwrap();

        let view = CartView::from(store.cart());
        assert_eq!(view.items_label(), "2 items");
        let item = view.items.first().unwrap();
        assert_eq!(item.price, "₹1,299.50");
        assert_eq!(item.line_price, "₹2,599");
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from(&Cart::default());
        assert!(view.is_empty());
        assert_eq!(view.total, "₹0");
    }
}
