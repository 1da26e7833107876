//! Catalog provider abstraction and its backends.
//!
//! # Architecture
//!
//! - [`CatalogProvider`] is the only way handlers reach products and categories
//! - [`RemoteCatalog`] talks to a REST catalog and caches responses via `moka`
//! - [`FixtureCatalog`] serves JSON files loaded once at startup and applies
//!   the filtering rules from `bazaar_core::filter` locally
//!
//! Both backends must return the same subset, in the same order, for the same
//! [`FilterSpec`].
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::catalog::{CatalogProvider, FixtureCatalog};
//!
//! let catalog = FixtureCatalog::load("crates/storefront/fixtures")?;
//! let phones = catalog.get_by_category("Electronics").await?;
//! ```

mod cache;
mod fixture;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use bazaar_core::filter::{self, FilterSpec};
use bazaar_core::{Category, Product, ProductId};
use thiserror::Error;

use crate::config::CatalogSource;

pub use fixture::{FixtureCatalog, FixtureLoadError};
pub use remote::RemoteCatalog;

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog could not be reached or answered with a failure status.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// No product has the requested ID.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The catalog answered with something that is not a product payload.
    #[error("Invalid catalog response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Read-only access to products and categories.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Every product, in catalog order.
    async fn get_all(&self) -> Result<Vec<Product>, CatalogError>;

    /// A single product. Fails with [`CatalogError::NotFound`] when absent.
    async fn get_by_id(&self, id: ProductId) -> Result<Product, CatalogError>;

    /// Products whose category equals `category` exactly.
    async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, CatalogError>;

    /// Case-insensitive text search over title, description and category.
    async fn search(&self, query: &str) -> Result<Vec<Product>, CatalogError>;

    /// Products passing every predicate of `spec`.
    async fn filter(&self, spec: &FilterSpec) -> Result<Vec<Product>, CatalogError>;

    /// Categories for the filter sidebar.
    async fn categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// Filter, then search within the result.
    async fn browse(
        &self,
        spec: &FilterSpec,
        query: Option<&str>,
    ) -> Result<Vec<Product>, CatalogError> {
        let filtered = if spec.is_unconstrained() {
            self.get_all().await?
        } else {
            self.filter(spec).await?
        };

        Ok(match query {
            Some(query) if !query.trim().is_empty() => filter::search(&filtered, query),
            _ => filtered,
        })
    }
}

/// Build the provider selected by configuration.
///
/// # Errors
///
/// Returns an error if fixture files cannot be read or parsed.
pub fn from_source(source: &CatalogSource) -> Result<Arc<dyn CatalogProvider>, FixtureLoadError> {
    Ok(match source {
        CatalogSource::Remote(config) => Arc::new(RemoteCatalog::new(config)),
        CatalogSource::Fixture { dir } => Arc::new(FixtureCatalog::load(dir)?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::types::product::tests_support::sample;
    use rust_decimal::Decimal;

    use super::*;

    fn catalog() -> FixtureCatalog {
        let mut cheap = sample(ProductId::new(1));
        cheap.title = "Cotton Tee".to_string();
        cheap.category = "Fashion".to_string();
        cheap.price = Decimal::new(499, 0);

        let mut phone = sample(ProductId::new(2));
        phone.title = "Phone".to_string();
        phone.description = "Cotton case included".to_string();
        phone.price = Decimal::new(19_999, 0);

        let mut lamp = sample(ProductId::new(3));
        lamp.title = "Desk Lamp".to_string();
        lamp.category = "Home".to_string();

        FixtureCatalog::new(vec![cheap, phone, lamp], Vec::new())
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[tokio::test]
    async fn test_browse_filters_then_searches() {
        let catalog = catalog();
        let spec = FilterSpec::for_category("Electronics");

        let products = catalog.browse(&spec, Some("cotton")).await.unwrap();
        assert_eq!(ids(&products), vec![2]);
    }

    #[tokio::test]
    async fn test_browse_blank_query_is_plain_filter() {
        let catalog = catalog();
        let products = catalog
            .browse(&FilterSpec::default(), Some("   "))
            .await
            .unwrap();
        assert_eq!(ids(&products), vec![1, 2, 3]);
    }
}
