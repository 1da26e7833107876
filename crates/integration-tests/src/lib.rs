//! Integration test harness for the Bazaar storefront.
//!
//! Builds the real router over the bundled fixture catalog and a cart stored
//! in a temporary directory, then drives it in-process with
//! `tower::ServiceExt::oneshot`. No network or server process is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use bazaar_core::{Category, Product, ProductId};
use bazaar_core::filter::FilterSpec;
use bazaar_storefront::catalog::{CatalogError, CatalogProvider, FixtureCatalog};
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::services::CartService;
use bazaar_storefront::state::AppState;
use bazaar_storefront::storage::FileStorage;
use tempfile::TempDir;
use tower::ServiceExt;
use url::form_urlencoded;

/// Bundled fixture catalog shipped with the storefront crate.
pub const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/fixtures");

/// A storefront router plus the temporary directory holding its cart.
pub struct TestApp {
    router: Router,
    _data_dir: Option<TempDir>,
}

impl TestApp {
    /// Storefront over the fixture catalog with a fresh, empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(fixture_catalog()))
    }

    /// Storefront over `catalog` with a fresh, empty cart.
    #[must_use]
    pub fn with_catalog(catalog: Arc<dyn CatalogProvider>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();
        Self::build(catalog, &path, Some(dir))
    }

    /// Storefront over the fixture catalog whose cart lives in `data_dir`.
    ///
    /// Two apps over the same directory see the same persisted cart.
    #[must_use]
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self::build(Arc::new(fixture_catalog()), data_dir, None)
    }

    fn build(
        catalog: Arc<dyn CatalogProvider>,
        data_dir: &Path,
        owned_dir: Option<TempDir>,
    ) -> Self {
        let data_dir = data_dir.display().to_string();
        let config = StorefrontConfig::from_lookup(&|key: &str| match key {
            "BAZAAR_DATA_DIR" => Some(data_dir.clone()),
            "CATALOG_FIXTURE_DIR" => Some(FIXTURES_DIR.to_string()),
            _ => None,
        })
        .expect("Failed to build test config");

        let storage = FileStorage::open(config.data_dir.clone()).expect("Failed to open storage");
        let state = AppState::new(config, catalog, CartService::new(storage));

        Self {
            router: bazaar_storefront::app(state),
            _data_dir: owned_dir,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET uri`.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("Invalid request"),
        )
        .await
    }

    /// `POST uri` with a url-encoded form body.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();

        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .expect("Invalid request"),
        )
        .await
    }

    /// Add a product to the cart through the HTTP route.
    pub async fn add_to_cart(&self, product_id: i32, quantity: u32) -> TestResponse {
        let product_id = product_id.to_string();
        let quantity = quantity.to_string();
        self.post_form(
            "/cart/add",
            &[("product_id", product_id.as_str()), ("quantity", quantity.as_str())],
        )
        .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }
}

/// Load the bundled fixture catalog.
#[must_use]
pub fn fixture_catalog() -> FixtureCatalog {
    FixtureCatalog::load(FIXTURES_DIR).expect("Failed to load fixtures")
}

/// A catalog whose backend is always down.
#[derive(Debug, Default)]
pub struct UnavailableCatalog;

impl UnavailableCatalog {
    fn error() -> CatalogError {
        CatalogError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl CatalogProvider for UnavailableCatalog {
    async fn get_all(&self) -> Result<Vec<Product>, CatalogError> {
        Err(Self::error())
    }

    async fn get_by_id(&self, _id: ProductId) -> Result<Product, CatalogError> {
        Err(Self::error())
    }

    async fn get_by_category(&self, _category: &str) -> Result<Vec<Product>, CatalogError> {
        Err(Self::error())
    }

    async fn search(&self, _query: &str) -> Result<Vec<Product>, CatalogError> {
        Err(Self::error())
    }

    async fn filter(&self, _spec: &FilterSpec) -> Result<Vec<Product>, CatalogError> {
        Err(Self::error())
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Err(Self::error())
    }
}

/// Valid shipping form fields.
#[must_use]
pub fn shipping_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("full_name", "Asha Rao"),
        ("email", "asha@example.com"),
        ("phone", "+91 98765 43210"),
        ("address", "12 MG Road"),
        ("city", "Bengaluru"),
        ("state", "Karnataka"),
        ("pincode", "560001"),
    ]
}
