//! REST catalog client.
//!
//! Uses `reqwest` 0.13 for HTTP. Caches products and categories using `moka`
//! (TTL from configuration); free-text search results are never cached.

use std::sync::Arc;

use async_trait::async_trait;
use bazaar_core::filter::FilterSpec;
use bazaar_core::{Category, Product, ProductId};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{CatalogError, CatalogProvider};
use crate::config::RemoteCatalogConfig;

/// Client for a remote REST catalog.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct RemoteCatalog {
    inner: Arc<RemoteCatalogInner>,
}

struct RemoteCatalogInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl RemoteCatalog {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &RemoteCatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(RemoteCatalogInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{path}",
            self.inner.base_url.as_str().trim_end_matches('/')
        )
    }

    /// GET a JSON document. Returns `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Option<T>, CatalogError> {
        let mut request = self.inner.client.get(self.endpoint(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Unavailable(format!("HTTP {status}")));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse catalog response"
                );
                Err(CatalogError::Parse(e))
            }
        }
    }

    async fn get_products(
        &self,
        query: &[(&'static str, String)],
    ) -> Result<Vec<Product>, CatalogError> {
        self.get_json("products", query)
            .await?
            .ok_or_else(|| CatalogError::Unavailable("products endpoint not found".to_string()))
    }

    /// Serve from cache, or fetch a product list and cache it.
    async fn cached_products(
        &self,
        key: CacheKey,
        query: &[(&'static str, String)],
    ) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!(?key, "Cache hit for products");
            return Ok(products);
        }

        let products = self.get_products(query).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }
}

/// Query parameters for a filter request, in a stable order.
///
/// Unset predicates are omitted so an unconstrained spec maps to `/products`.
pub(crate) fn filter_query(spec: &FilterSpec) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !spec.category.is_all() {
        params.push(("category", spec.category.to_string()));
    }
    if let Some(subcategory) = &spec.subcategory {
        params.push(("subcategory", subcategory.clone()));
    }
    if let Some(min) = spec.min_price {
        params.push(("minPrice", min.to_string()));
    }
    if let Some(max) = spec.max_price {
        params.push(("maxPrice", max.to_string()));
    }
    if let Some(rating) = spec.min_rating {
        params.push(("minRating", rating.to_string()));
    }
    if spec.in_stock_only {
        params.push(("inStockOnly", "true".to_string()));
    }
    params
}

#[async_trait]
impl CatalogProvider for RemoteCatalog {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Product>, CatalogError> {
        self.cached_products(CacheKey::AllProducts, &[]).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .get_json(&format!("products/{id}"), &[])
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, CatalogError> {
        self.cached_products(
            CacheKey::Category(category.to_string()),
            &[("category", category.to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        if query.trim().is_empty() {
            return self.get_all().await;
        }
        self.get_products(&[("search", query.trim().to_string())])
            .await
    }

    #[instrument(skip(self))]
    async fn filter(&self, spec: &FilterSpec) -> Result<Vec<Product>, CatalogError> {
        let params = filter_query(spec);
        if params.is_empty() {
            return self.get_all().await;
        }

        let key = params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        self.cached_products(CacheKey::Filter(key), &params).await
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .get_json("categories", &[])
            .await?
            .ok_or_else(|| {
                CatalogError::Unavailable("categories endpoint not found".to_string())
            })?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use bazaar_core::types::product::tests_support::sample;
    use rust_decimal::Decimal;

    use super::*;

    #[derive(Clone, Default)]
    struct Upstream {
        hits: Arc<AtomicUsize>,
    }

    async fn products(
        State(upstream): State<Upstream>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        upstream.hits.fetch_add(1, Ordering::SeqCst);
        let mut all = vec![sample(ProductId::new(1)), sample(ProductId::new(2))];
        if let Some(category) = params.get("category") {
            all.retain(|p| &p.category == category);
        }
        if params.contains_key("maxPrice") {
            all.truncate(1);
        }
        Json(all)
    }

    async fn product(Path(id): Path<i32>) -> impl IntoResponse {
        if id == 1 {
            Json(sample(ProductId::new(1))).into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn spawn_upstream(upstream: Upstream) -> Url {
        let app = Router::new()
            .route("/v1/products", get(products))
            .route("/v1/products/{id}", get(product))
            .route("/v1/categories", get(|| async { "not json" }))
            .with_state(upstream);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/v1/")).unwrap()
    }

    fn client(base_url: Url) -> RemoteCatalog {
        RemoteCatalog::new(&RemoteCatalogConfig {
            base_url,
            api_token: None,
            cache_ttl: Duration::from_secs(300),
        })
    }

    #[test]
    fn test_filter_query_omits_unset_predicates() {
        assert!(filter_query(&FilterSpec::default()).is_empty());

        let mut spec = FilterSpec::for_category("Electronics");
        spec.set_price_range(None, Some(Decimal::new(5000, 0)));
        spec.toggle_in_stock();

        assert_eq!(
            filter_query(&spec),
            vec![
                ("category", "Electronics".to_string()),
                ("maxPrice", "5000".to_string()),
                ("inStockOnly", "true".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_all_is_cached() {
        let upstream = Upstream::default();
        let catalog = client(spawn_upstream(upstream.clone()).await);

        assert_eq!(catalog.get_all().await.unwrap().len(), 2);
        assert_eq!(catalog.get_all().await.unwrap().len(), 2);
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_sends_query_parameters() {
        let catalog = client(spawn_upstream(Upstream::default()).await);

        let mut spec = FilterSpec::default();
        spec.set_price_range(None, Some(Decimal::new(150, 0)));
        let products = catalog.filter(&spec).await.unwrap();
        assert_eq!(products.len(), 1);

        let products = catalog.get_by_category("Fashion").await.unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let catalog = client(spawn_upstream(Upstream::default()).await);

        assert_eq!(catalog.get_by_id(ProductId::new(1)).await.unwrap().id.as_i32(), 1);
        assert!(matches!(
            catalog.get_by_id(ProductId::new(99)).await,
            Err(CatalogError::NotFound(id)) if id.as_i32() == 99
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let catalog = client(spawn_upstream(Upstream::default()).await);
        assert!(matches!(
            catalog.categories().await,
            Err(CatalogError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let catalog = client(Url::parse(&format!("http://{addr}")).unwrap());
        assert!(matches!(
            catalog.get_all().await,
            Err(CatalogError::Unavailable(_))
        ));
    }
}
