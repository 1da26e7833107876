//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use bazaar_core::{Product, ProductId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub title: String,
    pub brand: String,
    pub image: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub rating: String,
    /// Whole stars to fill, `0..=5`.
    pub stars: u8,
    pub review_count: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            image: product.primary_image().unwrap_or_default().to_string(),
            price: product.selling_price().display(),
            compare_at_price: product.compare_at_price().map(|p| p.display()),
            discount_percent: product.discount_percent(),
            rating: format!("{:.1}", product.rating),
            stars: filled_stars(product.rating),
            review_count: product.review_count,
            in_stock: product.in_stock,
        }
    }
}

/// Number of whole stars for a rating, clamped to `0..=5`.
fn filled_stars(rating: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
    let stars = rating.clamp(0.0, 5.0).floor() as u8;
    stars
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub card: ProductCardView,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub images: Vec<String>,
    pub specifications: Vec<(String, String)>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            card: ProductCardView::from(product),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            description: product.description.clone(),
            images: product.images.clone(),
            specifications: product
                .specifications
                .iter()
                .map(|(label, value)| (label.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound("Product not found".to_string()))?;

    let product = state.catalog().get_by_id(id).await?;

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
    })
}
