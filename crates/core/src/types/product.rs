//! Catalog product record.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A purchasable product as served by the catalog.
///
/// Products are owned by the catalog source and never mutated by the
/// storefront. The wire format uses camelCase keys with a capitalised `Id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "Id")]
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub original_price: Decimal,
    /// Average rating in `0.0..=5.0`.
    pub rating: f64,
    pub review_count: u32,
    pub in_stock: bool,
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl Product {
    /// The selling price in the default currency.
    #[must_use]
    pub fn selling_price(&self) -> Price {
        Price::inr(self.price)
    }

    /// The pre-discount price, when it is higher than the selling price.
    #[must_use]
    pub fn compare_at_price(&self) -> Option<Price> {
        (self.original_price > self.price).then(|| Price::inr(self.original_price))
    }

    /// Whole-percent discount off the original price, if discounted.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        if self.original_price <= self.price || self.original_price.is_zero() {
            return None;
        }

        let percent = ((self.original_price - self.price) / self.original_price
            * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        percent.to_u32()
    }

    /// The first image, used for cards and cart thumbnails.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod tests_support {
    //! Fixture builder shared by downstream test suites.

    use super::*;

    /// A minimal in-stock product priced at 100.
    #[must_use]
    pub fn sample(id: ProductId) -> Product {
        Product {
            id,
            title: format!("Product {id}"),
            brand: "Bazaar".to_string(),
            category: "Electronics".to_string(),
            subcategory: None,
            description: "A sample product".to_string(),
            price: Decimal::new(100, 0),
            original_price: Decimal::new(100, 0),
            rating: 4.0,
            review_count: 0,
            in_stock: true,
            images: vec![format!("https://cdn.example.com/{id}.jpg")],
            specifications: BTreeMap::new(),
        }
    }
}
