//! Catalog listing commands.

use bazaar_core::{FilterSpec, Product, ProductId};
use bazaar_storefront::catalog::CatalogProvider;

use super::CommandError;

/// One-line summary of a product for listings.
#[must_use]
pub fn product_line(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { "  (out of stock)" };
    format!(
        "{:>4}  {:<40} {:>10}  ★{:.1}{stock}",
        product.id.as_i32(),
        product.title,
        product.selling_price().display(),
        product.rating,
    )
}

/// Render products matching the filters, narrowed by `search`.
///
/// # Errors
///
/// Returns an error if the catalog could not be read.
pub async fn list(
    catalog: &dyn CatalogProvider,
    spec: &FilterSpec,
    search: Option<&str>,
) -> Result<String, CommandError> {
    let products = catalog.browse(spec, search).await?;
    Ok(render_list(&products))
}

pub(crate) fn render_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }

    let mut lines: Vec<String> = products.iter().map(product_line).collect();
    lines.push(match products.len() {
        1 => "1 product".to_string(),
        n => format!("{n} products"),
    });
    lines.join("\n")
}

/// Render the detail view of one product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the catalog could not
/// be read.
pub async fn show(catalog: &dyn CatalogProvider, id: i32) -> Result<String, CommandError> {
    let product = catalog.get_by_id(ProductId::new(id)).await?;

    let mut lines = vec![
        product.title.clone(),
        format!("by {}", product.brand),
        match &product.subcategory {
            Some(sub) => format!("{} / {sub}", product.category),
            None => product.category.clone(),
        },
        String::new(),
    ];

    let mut price = product.selling_price().display();
    if let (Some(compare), Some(discount)) =
        (product.compare_at_price(), product.discount_percent())
    {
        price = format!("{price}  (was {}, {discount}% off)", compare.display());
    }
    lines.push(price);
    lines.push(format!(
        "★{:.1} from {} reviews",
        product.rating, product.review_count
    ));
    lines.push(if product.in_stock {
        "In stock".to_string()
    } else {
        "Out of stock".to_string()
    });
    lines.push(String::new());
    lines.push(product.description.clone());

    if !product.specifications.is_empty() {
        lines.push(String::new());
        lines.extend(
            product
                .specifications
                .iter()
                .map(|(label, value)| format!("  {label}: {value}")),
        );
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_storefront::catalog::FixtureCatalog;

    use super::*;

    const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/fixtures");

    #[tokio::test]
    async fn test_list_applies_filters_and_search() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let spec = FilterSpec::for_category("Home & Kitchen");

        let output = list(&catalog, &spec, Some("mug")).await.unwrap();
        assert!(output.contains("Ceramic Coffee Mug"));
        assert!(!output.contains("Frying Pan"));
        assert!(output.ends_with("1 product"));
    }

    #[tokio::test]
    async fn test_list_empty_result() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let output = list(&catalog, &FilterSpec::default(), Some("zzz-no-match"))
            .await
            .unwrap();
        assert_eq!(output, "No products found");
    }

    #[tokio::test]
    async fn test_show_product() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let output = show(&catalog, 7).await.unwrap();

        assert!(output.starts_with("Ceramic Coffee Mug\nby Hearth"));
        assert!(output.contains("₹250  (was ₹350, 29% off)"));
        assert!(output.contains("In stock"));
    }

    #[tokio::test]
    async fn test_show_missing_product() {
        let catalog = FixtureCatalog::load(FIXTURES).unwrap();
        let err = show(&catalog, 999).await.unwrap_err();
        assert!(matches!(err, CommandError::Catalog(_)));
    }

    #[test]
    fn test_out_of_stock_marker() {
        let mut product = bazaar_core::types::product::tests_support::sample(ProductId::new(3));
        product.in_stock = false;
        assert!(product_line(&product).ends_with("(out of stock)"));
    }
}
