//! Checkout and order confirmation handlers.
//!
//! Checkout is two forms: shipping details, then payment method. Shipping
//! values are carried into the payment step as hidden inputs, so no checkout
//! state is kept on the server between requests.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::checkout::CheckoutError;
use bazaar_core::{
    Checkout, FieldErrors, OrderConfirmation, PaymentMethod, ShippingDetails,
    ShippingField,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use url::form_urlencoded;

use super::cart::CartView;
use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// Shipping form field display data.
#[derive(Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub placeholder: &'static str,
    pub value: String,
    pub error: Option<&'static str>,
}

impl FieldView {
    fn new(field: ShippingField, shipping: &ShippingDetails, errors: &FieldErrors) -> Self {
        let (label, input_type, placeholder) = match field {
            ShippingField::FullName => ("Full Name", "text", "John Doe"),
            ShippingField::Email => ("Email", "email", "john@example.com"),
            ShippingField::Phone => ("Phone", "tel", "+91 98765 43210"),
            ShippingField::Address => (
                "Address",
                "text",
                "Street address, apartment, suite, etc.",
            ),
            ShippingField::City => ("City", "text", "Mumbai"),
            ShippingField::State => ("State", "text", "Maharashtra"),
            ShippingField::Pincode => ("Pincode", "text", "400001"),
        };

        Self {
            name: field.name(),
            label,
            input_type,
            placeholder,
            value: shipping.value(field).to_string(),
            error: errors.get(field),
        }
    }
}

/// Payment method radio display data.
#[derive(Clone)]
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Checkout page display data.
#[derive(Clone)]
pub struct CheckoutView {
    pub step: u8,
    pub fields: Vec<FieldView>,
    pub payments: Vec<PaymentOptionView>,
}

impl From<&Checkout> for CheckoutView {
    fn from(checkout: &Checkout) -> Self {
        Self {
            step: checkout.step().number(),
            fields: ShippingField::ALL
                .into_iter()
                .map(|field| FieldView::new(field, checkout.shipping(), checkout.errors()))
                .collect(),
            payments: PaymentMethod::ALL
                .into_iter()
                .map(|method| PaymentOptionView {
                    value: method.as_str(),
                    label: method.label(),
                    checked: method == checkout.payment(),
                })
                .collect(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub checkout: CheckoutView,
    pub summary: CartView,
}

/// Order confirmation display data.
#[derive(Clone)]
pub struct ConfirmationView {
    pub order_id: String,
    pub order_total: String,
    pub order_date: String,
}

impl From<&OrderConfirmation> for ConfirmationView {
    fn from(order: &OrderConfirmation) -> Self {
        Self {
            order_id: order.order_id.clone(),
            order_total: order.total_price().display(),
            order_date: order.order_date.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "order_confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: ConfirmationView,
}

/// Place order form data: shipping carried over plus the payment choice.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub payment: PaymentMethod,
}

/// Confirmation query parameters, as produced by [`confirmation_url`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationQuery {
    pub order_id: Option<String>,
    pub order_total: Option<String>,
    pub order_date: Option<String>,
}

impl ConfirmationQuery {
    /// Rebuild the confirmation payload, if every part is present and valid.
    #[must_use]
    pub fn into_confirmation(self) -> Option<OrderConfirmation> {
        let order_id = self.order_id.filter(|id| !id.trim().is_empty())?;
        let order_total = self.order_total?.parse::<Decimal>().ok()?;
        let order_date = DateTime::parse_from_rfc3339(&self.order_date?)
            .ok()?
            .with_timezone(&Utc);

        Some(OrderConfirmation {
            order_id,
            order_total,
            order_date,
        })
    }
}

/// Confirmation page URL carrying the order payload in its query string.
#[must_use]
pub fn confirmation_url(order: &OrderConfirmation) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("orderId", &order.order_id)
        .append_pair("orderTotal", &order.order_total.to_string())
        .append_pair(
            "orderDate",
            &order.order_date.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .finish();
    format!("/order-confirmation?{query}")
}

fn render(checkout: &Checkout, summary: CartView, status: StatusCode) -> Response {
    (
        status,
        CheckoutTemplate {
            checkout: CheckoutView::from(checkout),
            summary,
        },
    )
        .into_response()
}

/// Display the shipping step.
///
/// Redirects to the cart when there is nothing to check out.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Response {
    let cart = state.cart().snapshot().await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    render(&Checkout::default(), CartView::from(&cart), StatusCode::OK)
}

/// Validate shipping details and move to the payment step.
///
/// Invalid details re-render the shipping step with per-field errors.
#[instrument(skip(state, form))]
pub async fn shipping(
    State(state): State<AppState>,
    Form(form): Form<ShippingDetails>,
) -> Response {
    let cart = state.cart().snapshot().await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let mut checkout = Checkout::with_shipping(form);
    let status = if checkout.advance() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    render(&checkout, CartView::from(&cart), status)
}

/// Place the order and redirect to the confirmation page.
#[instrument(skip(state, form), fields(payment = form.payment.as_str()))]
pub async fn place(
    State(state): State<AppState>,
    Form(form): Form<PlaceOrderForm>,
) -> Result<Response> {
    match state.cart().place_order(&form.shipping, Utc::now()).await {
        Ok(order) => {
            info!(order_id = %order.order_id, "Redirecting to order confirmation");
            add_breadcrumb(
                "checkout",
                "Order placed",
                &[
                    ("order_id", order.order_id.clone()),
                    ("payment", form.payment.as_str().to_string()),
                ],
            );
            Ok(Redirect::to(&confirmation_url(&order)).into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/cart").into_response()),
        Err(CheckoutError::Invalid(_)) => {
            let cart = state.cart().snapshot().await;
            let mut checkout = Checkout::with_shipping(form.shipping);
            checkout.set_payment(form.payment);
            checkout.advance();
            Ok(render(
                &checkout,
                CartView::from(&cart),
                StatusCode::UNPROCESSABLE_ENTITY,
            ))
        }
    }
}

/// Display the order confirmation.
///
/// Without a complete order payload there is nothing to confirm, so the
/// shopper is sent home.
#[instrument(skip(query))]
pub async fn confirmation(Query(query): Query<ConfirmationQuery>) -> Response {
    match query.into_confirmation() {
        Some(order) => ConfirmationTemplate {
            order: ConfirmationView::from(&order),
        }
        .into_response(),
        None => Redirect::to("/").into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::CheckoutStep;
    use chrono::TimeZone;

    use super::*;

    fn order() -> OrderConfirmation {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        OrderConfirmation {
            order_id: bazaar_core::checkout::order_id(now),
            order_total: Decimal::new(1180, 0),
            order_date: now,
        }
    }

    #[test]
    fn test_confirmation_url_round_trip() {
        let order = order();
        let url = confirmation_url(&order);
        assert!(url.starts_with("/order-confirmation?orderId=ORD"));

        let Query(query) =
            Query::<ConfirmationQuery>::try_from_uri(&url.parse().unwrap()).unwrap();
        assert_eq!(query.into_confirmation(), Some(order));
    }

    #[test]
    fn test_incomplete_query_has_no_confirmation() {
        assert!(ConfirmationQuery::default().into_confirmation().is_none());

        let query = ConfirmationQuery {
            order_id: Some("ORD1".to_string()),
            order_total: Some("abc".to_string()),
            order_date: Some("2026-03-14T09:26:53Z".to_string()),
        };
        assert!(query.into_confirmation().is_none());
    }

    #[test]
    fn test_confirmation_view_formats() {
        let view = ConfirmationView::from(&order());
        assert_eq!(view.order_total, "₹1,180");
        assert_eq!(view.order_date, "March 14, 2026");
    }

    #[test]
    fn test_checkout_view_shows_field_errors() {
        let mut checkout = Checkout::default();
        checkout.set_field(ShippingField::FullName, "Asha Rao");
        assert!(!checkout.advance());
        assert_eq!(checkout.step(), CheckoutStep::Shipping);

        let view = CheckoutView::from(&checkout);
        assert_eq!(view.step, 1);

        let name = view.fields.iter().find(|f| f.name == "full_name").unwrap();
        assert_eq!(name.value, "Asha Rao");
        assert!(name.error.is_none());

        let phone = view.fields.iter().find(|f| f.name == "phone").unwrap();
        assert_eq!(phone.error, Some("Phone number is required"));

        let card = view.payments.first().unwrap();
        assert_eq!(card.value, "card");
        assert!(card.checked);
    }
}
