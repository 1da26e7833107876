//! Fallback for unknown paths.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use tracing::debug;

/// Page shown for any route the storefront doesn't serve.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub path: String,
}

/// Render the not found page with a 404 status.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    debug!(path = %uri.path(), "No route matched");
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            path: uri.path().to_string(),
        },
    )
}
