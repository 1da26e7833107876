//! Client-side catalog filtering and text search.
//!
//! These functions are the reference semantics for narrowing a product
//! collection. Remote catalog backends that filter server-side are expected to
//! return the same subset, in the same order, for the same [`FilterSpec`].
//!
//! All functions are pure: they borrow the input, never reorder it, and return
//! a fresh vector. An empty input always yields an empty output.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Sentinel category name meaning "do not filter by category".
pub const ALL_CATEGORIES: &str = "All";

/// The category predicate of a [`FilterSpec`].
///
/// Serialized as a plain string, with [`ALL_CATEGORIES`] standing in for
/// [`CategorySelection::All`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategorySelection {
    #[default]
    All,
    Named(String),
}

impl CategorySelection {
    /// The category name, or the `All` sentinel.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Named(name) => name,
        }
    }

    /// Whether this selection narrows the catalog at all.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<String> for CategorySelection {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ALL_CATEGORIES {
            Self::All
        } else if trimmed.len() == value.len() {
            Self::Named(value)
        } else {
            Self::Named(trimmed.to_string())
        }
    }
}

impl From<&str> for CategorySelection {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<CategorySelection> for String {
    fn from(value: CategorySelection) -> Self {
        match value {
            CategorySelection::All => ALL_CATEGORIES.to_string(),
            CategorySelection::Named(name) => name,
        }
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simultaneously applied predicates narrowing the catalog.
///
/// Every field defaults to "no constraint". Lives only for a browsing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub category: CategorySelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub in_stock_only: bool,
}

impl FilterSpec {
    /// A spec narrowed to a single category.
    #[must_use]
    pub fn for_category(category: impl Into<CategorySelection>) -> Self {
        Self {
            category: category.into(),
            ..Self::default()
        }
    }

    /// Whether no predicate is active.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Select a category (and optionally one of its subcategories).
    ///
    /// Choosing a new category always resets the subcategory.
    pub fn select_category(
        &mut self,
        category: impl Into<CategorySelection>,
        subcategory: Option<String>,
    ) {
        self.category = category.into();
        self.subcategory = subcategory.filter(|s| !s.trim().is_empty());
    }

    /// Set both price bounds at once.
    pub const fn set_price_range(&mut self, min: Option<Decimal>, max: Option<Decimal>) {
        self.min_price = min;
        self.max_price = max;
    }

    /// Select a minimum rating; selecting the active rating again clears it.
    pub fn toggle_min_rating(&mut self, rating: f64) {
        self.min_rating = match self.min_rating {
            Some(current) if (current - rating).abs() < f64::EPSILON => None,
            _ => Some(rating),
        };
    }

    /// Flip the in-stock-only predicate.
    pub const fn toggle_in_stock(&mut self) {
        self.in_stock_only = !self.in_stock_only;
    }

    /// Reset every predicate.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a single product passes every active predicate.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let CategorySelection::Named(category) = &self.category
            && product.category != *category
        {
            return false;
        }

        if let Some(subcategory) = &self.subcategory
            && product.subcategory.as_ref() != Some(subcategory)
        {
            return false;
        }

        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }

        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }

        if self.min_rating.is_some_and(|min| product.rating < min) {
            return false;
        }

        !self.in_stock_only || product.in_stock
    }
}

/// Apply every predicate of `spec` to `products`, preserving input order.
#[must_use]
pub fn filter(products: &[Product], spec: &FilterSpec) -> Vec<Product> {
    products
        .iter()
        .filter(|product| spec.matches(product))
        .cloned()
        .collect()
}

/// Case-insensitive substring search over title, description and category.
///
/// A blank query returns the full collection.
#[must_use]
pub fn search(products: &[Product], query: &str) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }

    products
        .iter()
        .filter(|product| matches_query(product, &needle))
        .cloned()
        .collect()
}

/// Filter first, then search within the filtered subset.
///
/// Search and filter compose: a query narrows whatever the filters left.
#[must_use]
pub fn browse(products: &[Product], spec: &FilterSpec, query: Option<&str>) -> Vec<Product> {
    let filtered = filter(products, spec);
    match query {
        Some(query) if !query.trim().is_empty() => search(&filtered, query),
        _ => filtered,
    }
}

/// `needle` must already be lowercased and trimmed.
fn matches_query(product: &Product, needle: &str) -> bool {
    [&product.title, &product.description, &product.category]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;
    use crate::types::product::tests_support::sample;

    fn product(
        id: i32,
        title: &str,
        category: &str,
        subcategory: Option<&str>,
        price: i64,
        rating: f64,
        in_stock: bool,
    ) -> Product {
        let mut product = sample(ProductId::new(id));
        product.title = title.to_string();
        product.category = category.to_string();
        product.subcategory = subcategory.map(str::to_string);
        product.price = Decimal::new(price, 0);
        product.original_price = Decimal::new(price, 0);
        product.rating = rating;
        product.in_stock = in_stock;
        product
    }

    fn fixture() -> Vec<Product> {
        vec![
            product(1, "Smartphone X", "Electronics", Some("Phones"), 450, 4.5, true),
            product(2, "Budget Cable", "Electronics", Some("Accessories"), 50, 4.8, true),
            product(3, "Laptop Pro", "Electronics", Some("Computers"), 900, 4.9, true),
            product(4, "Headphones", "Electronics", Some("Audio"), 300, 3.5, true),
            product(5, "Smartwatch", "Electronics", Some("Wearables"), 250, 4.2, false),
            product(6, "Cotton Shirt", "Fashion", Some("Men"), 200, 4.6, true),
            product(7, "Speaker", "Electronics", Some("Audio"), 100, 4.0, true),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_unconstrained_filter_returns_everything_in_order() {
        let products = fixture();
        let result = filter(&products, &FilterSpec::default());
        assert_eq!(result, products);
    }

    #[test]
    fn test_all_five_predicates() {
        let spec = FilterSpec {
            category: "Electronics".into(),
            subcategory: None,
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(500, 0)),
            min_rating: Some(4.0),
            in_stock_only: true,
        };

        // 2: too cheap, 3: too expensive, 4: low rating, 5: out of stock,
        // 6: wrong category. Bounds are inclusive, so 7 at exactly 100 passes.
        assert_eq!(ids(&filter(&fixture(), &spec)), vec![1, 7]);
    }

    #[test]
    fn test_subcategory_requires_exact_match() {
        let mut spec = FilterSpec::for_category("Electronics");
        spec.subcategory = Some("Audio".to_string());
        assert_eq!(ids(&filter(&fixture(), &spec)), vec![4, 7]);
    }

    #[test]
    fn test_single_price_bound() {
        let spec = FilterSpec {
            max_price: Some(Decimal::new(200, 0)),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter(&fixture(), &spec)), vec![2, 6, 7]);
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let products = fixture();
        let before = products.clone();
        let _ = filter(&products, &FilterSpec::for_category("Fashion"));
        assert_eq!(products, before);
    }

    #[test]
    fn test_empty_collection() {
        assert!(filter(&[], &FilterSpec::for_category("Fashion")).is_empty());
        assert!(search(&[], "phone").is_empty());
        assert!(browse(&[], &FilterSpec::default(), Some("phone")).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut products = fixture();
        products[5].description = "Breathable SMART fabric".to_string();

        // "smart" hits two titles and one description.
        assert_eq!(ids(&search(&products, "SmArT")), vec![1, 5, 6]);
        // Category matches too.
        assert_eq!(ids(&search(&products, "fashion")), vec![6]);
    }

    #[test]
    fn test_blank_search_returns_full_set() {
        let products = fixture();
        assert_eq!(search(&products, "   "), products);
        assert_eq!(search(&products, ""), products);
    }

    #[test]
    fn test_browse_composes_filter_and_search() {
        let spec = FilterSpec {
            in_stock_only: true,
            ..FilterSpec::default()
        };
        // Smartwatch (5) matches the query but is out of stock.
        assert_eq!(ids(&browse(&fixture(), &spec, Some("smart"))), vec![1]);
        assert_eq!(ids(&browse(&fixture(), &spec, Some(" "))).len(), 6);
    }

    #[test]
    fn test_category_selection_sentinel() {
        assert_eq!(CategorySelection::from("All"), CategorySelection::All);
        assert_eq!(CategorySelection::from(""), CategorySelection::All);
        assert_eq!(
            CategorySelection::from(" Fashion "),
            CategorySelection::Named("Fashion".to_string())
        );

        let json = serde_json::to_string(&FilterSpec::default()).unwrap();
        assert_eq!(json, r#"{"category":"All","inStockOnly":false}"#);
    }

    #[test]
    fn test_toggle_rating_and_clear() {
        let mut spec = FilterSpec::default();
        spec.toggle_min_rating(4.0);
        assert_eq!(spec.min_rating, Some(4.0));
        spec.toggle_min_rating(3.0);
        assert_eq!(spec.min_rating, Some(3.0));
        spec.toggle_min_rating(3.0);
        assert_eq!(spec.min_rating, None);

        spec.toggle_in_stock();
        spec.select_category("Fashion", Some("Men".to_string()));
        assert!(!spec.is_unconstrained());
        spec.clear();
        assert!(spec.is_unconstrained());
    }
}
