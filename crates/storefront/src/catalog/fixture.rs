//! Catalog backed by JSON files on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bazaar_core::filter::{self, FilterSpec};
use bazaar_core::{Category, Product, ProductId};
use thiserror::Error;
use tracing::{info, instrument};

use super::{CatalogError, CatalogProvider};

const PRODUCTS_FILE: &str = "products.json";
const CATEGORIES_FILE: &str = "categories.json";

/// Errors loading fixture files at startup.
#[derive(Debug, Error)]
pub enum FixtureLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// In-memory catalog loaded from `products.json` and `categories.json`.
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl FixtureCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// Load both fixture files from `dir`.
    ///
    /// A missing `categories.json` yields an empty category list; a missing
    /// `products.json` is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or is not valid JSON.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, FixtureLoadError> {
        let dir = dir.as_ref();
        let products: Vec<Product> = read_json(&dir.join(PRODUCTS_FILE))?;

        let categories_path = dir.join(CATEGORIES_FILE);
        let categories = if categories_path.exists() {
            read_json(&categories_path)?
        } else {
            Vec::new()
        };

        info!(
            dir = %dir.display(),
            products = products.len(),
            categories = categories.len(),
            "Loaded catalog fixtures"
        );
        Ok(Self::new(products, categories))
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FixtureLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| FixtureLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| FixtureLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl CatalogProvider for FixtureCatalog {
    async fn get_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.clone())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|product| product.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .iter()
            .filter(|product| product.category == category)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        Ok(filter::search(&self.products, query))
    }

    #[instrument(skip(self))]
    async fn filter(&self, spec: &FilterSpec) -> Result<Vec<Product>, CatalogError> {
        Ok(filter::filter(&self.products, spec))
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    #[test]
    fn test_bundled_fixtures_load() {
        let catalog = FixtureCatalog::load(fixtures_dir()).unwrap();
        assert!(!catalog.products().is_empty());
        assert!(catalog.products().iter().all(|p| !p.images.is_empty()));
    }

    #[tokio::test]
    async fn test_bundled_categories_match_products() {
        let catalog = FixtureCatalog::load(fixtures_dir()).unwrap();
        for category in catalog.categories().await.unwrap() {
            let products = catalog.get_by_category(&category.name).await.unwrap();
            assert_eq!(
                u32::try_from(products.len()).unwrap(),
                category.product_count,
                "{}",
                category.name
            );
        }
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let catalog = FixtureCatalog::load(fixtures_dir()).unwrap();
        let first = catalog.products().first().cloned().unwrap();

        assert_eq!(catalog.get_by_id(first.id).await.unwrap(), first);
        assert!(matches!(
            catalog.get_by_id(ProductId::new(-1)).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_products_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FixtureCatalog::load(dir.path()),
            Err(FixtureLoadError::Read { .. })
        ));
    }

    #[test]
    fn test_missing_categories_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PRODUCTS_FILE), "[]").unwrap();

        let catalog = FixtureCatalog::load(dir.path()).unwrap();
        assert!(catalog.products().is_empty());
        assert!(catalog.categories.is_empty());
    }

    #[test]
    fn test_malformed_products_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PRODUCTS_FILE), "{").unwrap();
        assert!(matches!(
            FixtureCatalog::load(dir.path()),
            Err(FixtureLoadError::Parse { .. })
        ));
    }
}
