//! Cart management commands.
//!
//! These operate on the same persisted cart as the storefront, so a line
//! added here shows up in the browser on next load.

use bazaar_core::{Cart, CartStorage, CartStore, Price, ProductId};
use bazaar_storefront::catalog::CatalogProvider;

use super::CommandError;

/// Render cart lines and totals.
#[must_use]
pub fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty".to_string();
    }

    let mut lines: Vec<String> = cart
        .lines()
        .iter()
        .map(|line| {
            format!(
                "{:>4}  {:<40} {:>3} × {:>10} = {:>10}",
                line.product_id().as_i32(),
                line.product.title,
                line.quantity,
                line.product.selling_price().display(),
                Price::inr(line.line_total()).display(),
            )
        })
        .collect();

    let totals = cart.totals();
    lines.push(String::new());
    let units = match cart.item_count() {
        1 => "1 item".to_string(),
        n => format!("{n} items"),
    };
    lines.push(format!(
        "Subtotal ({units}): {}",
        totals.subtotal_price().display()
    ));
    lines.push(format!("Tax (18%): {}", totals.tax_price().display()));
    lines.push(format!("Total: {}", totals.total_price().display()));
    lines.join("\n")
}

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns an error if the product is unknown or out of stock, or the cart
/// could not be persisted.
pub async fn add<S: CartStorage>(
    store: &mut CartStore<S>,
    catalog: &dyn CatalogProvider,
    id: i32,
    quantity: u32,
) -> Result<String, CommandError> {
    let product = catalog.get_by_id(ProductId::new(id)).await?;
    if !product.in_stock {
        return Err(CommandError::Rejected(format!(
            "{} is out of stock",
            product.title
        )));
    }

    store.add(&product, quantity)?;
    Ok(render(store.cart()))
}

/// Set the quantity of a line already in the cart.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the cart could not
/// be persisted.
pub fn update<S: CartStorage>(
    store: &mut CartStore<S>,
    id: i32,
    quantity: i64,
) -> Result<String, CommandError> {
    if !store.update_quantity(ProductId::new(id), quantity)? {
        return Err(not_in_cart(id));
    }
    Ok(render(store.cart()))
}

/// Remove a line from the cart.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the cart could not
/// be persisted.
pub fn remove<S: CartStorage>(store: &mut CartStore<S>, id: i32) -> Result<String, CommandError> {
    if !store.remove(ProductId::new(id))? {
        return Err(not_in_cart(id));
    }
    Ok(render(store.cart()))
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart could not be persisted.
pub fn clear<S: CartStorage>(store: &mut CartStore<S>) -> Result<String, CommandError> {
    store.clear()?;
    Ok(render(store.cart()))
}

fn not_in_cart(id: i32) -> CommandError {
    CommandError::Rejected(format!("Product {id} is not in the cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::MemoryStorage;
    use bazaar_storefront::catalog::FixtureCatalog;
    use bazaar_storefront::storage::FileStorage;

    use super::*;

    const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/fixtures");

    #[tokio::test]
    async fn test_add_shows_totals() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let mut store = CartStore::open(MemoryStorage::default());

        let output = add(&mut store, &catalog, 7, 1).await.unwrap();
        assert!(output.contains("Ceramic Coffee Mug"));
        assert!(output.contains("Subtotal (1 item): ₹250"));
        assert!(output.contains("Tax (18%): ₹45"));
        assert!(output.ends_with("Total: ₹295"));
    }

    #[tokio::test]
    async fn test_add_out_of_stock_is_rejected() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let mut store = CartStore::open(MemoryStorage::default());

        let err = add(&mut store, &catalog, 3, 1).await.unwrap_err();
        assert!(matches!(err, CommandError::Rejected(_)));
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_cart_persists_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();

        let mut store = CartStore::open(FileStorage::open(dir.path()).unwrap());
        add(&mut store, &catalog, 8, 1).await.unwrap();
        drop(store);

        let store = CartStore::open(FileStorage::open(dir.path()).unwrap());
        let output = render(store.cart());
        assert!(output.contains("Tax (18%): ₹180"));
        assert!(output.ends_with("Total: ₹1,180"));
    }

    #[test]
    fn test_update_and_remove_unknown_line() {
        let mut store = CartStore::open(MemoryStorage::default());
        assert!(matches!(
            update(&mut store, 7, 2).unwrap_err(),
            CommandError::Rejected(_)
        ));
        assert!(matches!(
            remove(&mut store, 7).unwrap_err(),
            CommandError::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn test_update_clamps_and_clear_empties() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let mut store = CartStore::open(MemoryStorage::default());
        add(&mut store, &catalog, 7, 3).await.unwrap();

        update(&mut store, 7, 0).unwrap();
        assert_eq!(store.cart().item_count(), 1);

        assert_eq!(clear(&mut store).unwrap(), "Your cart is empty");
    }
}
