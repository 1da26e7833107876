//! Product grid and filter sidebar handlers.
//!
//! Filter state lives in the query string, so every filter link is a plain
//! URL. HTMX swaps only the `#catalog` element when one is followed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bazaar_core::filter::FilterSpec;
use bazaar_core::{Category, CategorySelection};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{instrument, warn};
use url::form_urlencoded;

use super::products::ProductCardView;
use crate::state::AppState;

/// Rating thresholds offered in the sidebar, highest first.
const RATING_OPTIONS: [u8; 4] = [4, 3, 2, 1];

/// Browse query parameters.
///
/// Every field is kept as raw text so blank form inputs are accepted and
/// read as "not set".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_rating: Option<String>,
    pub in_stock: Option<String>,
}

impl BrowseQuery {
    /// Query that reproduces `spec` and `search`.
    #[must_use]
    pub fn from_spec(spec: &FilterSpec, search: Option<&str>) -> Self {
        Self {
            search: search.map(str::to_string),
            category: (!spec.category.is_all()).then(|| spec.category.to_string()),
            subcategory: spec.subcategory.clone(),
            min_price: spec.min_price.map(|p| p.to_string()),
            max_price: spec.max_price.map(|p| p.to_string()),
            min_rating: spec.min_rating.map(|r| r.to_string()),
            in_stock: spec.in_stock_only.then(|| "true".to_string()),
        }
    }

    /// The filter predicates described by this query.
    #[must_use]
    pub fn filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::default();
        spec.select_category(
            CategorySelection::from(self.category.clone().unwrap_or_default()),
            self.subcategory.clone(),
        );
        spec.set_price_range(
            parse_field::<Decimal>(self.min_price.as_deref()),
            parse_field::<Decimal>(self.max_price.as_deref()),
        );
        spec.min_rating = parse_field::<f64>(self.min_rating.as_deref());
        spec.in_stock_only = self.in_stock.as_deref().is_some_and(is_checked);
        spec
    }

    /// The search text, if any non-blank text was given.
    #[must_use]
    pub fn search_query(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }

    /// Root-relative URL carrying this query.
    #[must_use]
    pub fn href(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let pairs = [
            ("search", &self.search),
            ("category", &self.category),
            ("subcategory", &self.subcategory),
            ("min_price", &self.min_price),
            ("max_price", &self.max_price),
            ("min_rating", &self.min_rating),
            ("in_stock", &self.in_stock),
        ];
        for (name, value) in pairs {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                serializer.append_pair(name, value);
            }
        }

        let query = serializer.finish();
        if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{query}")
        }
    }
}

/// Parse a form value, treating blank or malformed input as unset.
fn parse_field<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

fn is_checked(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "1")
}

// =============================================================================
// View Models
// =============================================================================

/// Subcategory link in the sidebar.
#[derive(Clone)]
pub struct SubcategoryOption {
    pub name: String,
    pub url: String,
    pub active: bool,
}

/// Category link in the sidebar.
#[derive(Clone)]
pub struct CategoryOption {
    pub name: String,
    pub url: String,
    pub active: bool,
    pub product_count: u32,
    pub subcategories: Vec<SubcategoryOption>,
}

/// Minimum rating toggle in the sidebar.
#[derive(Clone)]
pub struct RatingOption {
    pub stars: u8,
    pub url: String,
    pub active: bool,
}

/// Filter sidebar display data.
#[derive(Clone)]
pub struct FiltersView {
    pub all_url: String,
    pub all_active: bool,
    pub categories: Vec<CategoryOption>,
    pub ratings: Vec<RatingOption>,
    /// Typed bounds; blank when unset.
    pub min_price: String,
    pub max_price: String,
    pub in_stock_only: bool,
    /// Current values carried by the price form as hidden inputs.
    pub category: String,
    pub subcategory: String,
    pub min_rating: String,
    pub search: String,
    pub clear_url: String,
    pub has_active_filters: bool,
    /// Quiet period before price edits are submitted.
    pub debounce_ms: u128,
}

impl FiltersView {
    #[must_use]
    pub fn new(
        spec: &FilterSpec,
        search: Option<&str>,
        categories: &[Category],
        debounce_ms: u128,
    ) -> Self {
        let url_for = |edit: &dyn Fn(&mut FilterSpec)| {
            let mut next = spec.clone();
            edit(&mut next);
            BrowseQuery::from_spec(&next, search).href()
        };

        let categories = categories
            .iter()
            .map(|category| {
                let active = spec.category.as_str() == category.name;
                CategoryOption {
                    name: category.name.clone(),
                    url: url_for(&|s| s.select_category(category.name.as_str(), None)),
                    active,
                    product_count: category.product_count,
                    subcategories: category
                        .subcategories
                        .iter()
                        .map(|sub| SubcategoryOption {
                            name: sub.clone(),
                            url: url_for(&|s| {
                                s.select_category(category.name.as_str(), Some(sub.clone()));
                            }),
                            active: active && spec.subcategory.as_deref() == Some(sub.as_str()),
                        })
                        .collect(),
                }
            })
            .collect();

        let ratings = RATING_OPTIONS
            .into_iter()
            .map(|stars| RatingOption {
                stars,
                url: url_for(&|s| s.toggle_min_rating(f64::from(stars))),
                active: spec
                    .min_rating
                    .is_some_and(|r| (r - f64::from(stars)).abs() < f64::EPSILON),
            })
            .collect();

        Self {
            all_url: url_for(&|s| s.select_category(CategorySelection::All, None)),
            all_active: spec.category.is_all(),
            categories,
            ratings,
            min_price: spec.min_price.map(|p| p.to_string()).unwrap_or_default(),
            max_price: spec.max_price.map(|p| p.to_string()).unwrap_or_default(),
            in_stock_only: spec.in_stock_only,
            category: if spec.category.is_all() {
                String::new()
            } else {
                spec.category.to_string()
            },
            subcategory: spec.subcategory.clone().unwrap_or_default(),
            min_rating: spec.min_rating.map(|r| r.to_string()).unwrap_or_default(),
            search: search.unwrap_or_default().to_string(),
            clear_url: BrowseQuery::from_spec(&FilterSpec::default(), search).href(),
            has_active_filters: !spec.is_unconstrained(),
            debounce_ms,
        }
    }
}

/// Product grid display data.
#[derive(Clone)]
pub struct GridView {
    pub heading: String,
    pub products: Vec<ProductCardView>,
    /// The catalog could not be loaded.
    pub failed: bool,
    pub retry_url: String,
}

impl GridView {
    /// Label for the result count.
    #[must_use]
    pub fn count_label(&self) -> String {
        match self.products.len() {
            1 => "1 product".to_string(),
            n => format!("{n} products"),
        }
    }
}

fn heading(spec: &FilterSpec, search: Option<&str>) -> String {
    match (search, &spec.category) {
        (Some(query), _) => format!("Search Results for \"{query}\""),
        (None, CategorySelection::All) => "All Products".to_string(),
        (None, CategorySelection::Named(name)) => name.clone(),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub filters: FiltersView,
    pub grid: GridView,
}

/// Filter sidebar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/filters.html")]
pub struct FiltersTemplate {
    pub filters: FiltersView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Load categories for the sidebar; a failure degrades to an empty list.
async fn load_categories(state: &AppState) -> Vec<Category> {
    state.catalog().categories().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load categories");
        Vec::new()
    })
}

fn debounce_ms(state: &AppState) -> u128 {
    state.config().price_debounce.as_millis()
}

/// Display the product grid.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>, Query(query): Query<BrowseQuery>) -> Response {
    let spec = query.filter_spec();
    let search = query.search_query();

    let categories = load_categories(&state).await;
    let filters = FiltersView::new(&spec, search, &categories, debounce_ms(&state));

    let (products, failed) = match state.catalog().browse(&spec, search).await {
        Ok(products) => (products, false),
        Err(e) => {
            warn!(error = %e, "Failed to load products");
            (Vec::new(), true)
        }
    };

    let grid = GridView {
        heading: heading(&spec, search),
        products: products.iter().map(ProductCardView::from).collect(),
        failed,
        retry_url: BrowseQuery::from_spec(&spec, search).href(),
    };

    let status = if failed {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, HomeTemplate { filters, grid }).into_response()
}

/// Display the filter sidebar fragment.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> impl IntoResponse {
    let spec = query.filter_spec();
    let categories = load_categories(&state).await;

    FiltersTemplate {
        filters: FiltersView::new(
            &spec,
            query.search_query(),
            &categories,
            debounce_ms(&state),
        ),
    }
}
