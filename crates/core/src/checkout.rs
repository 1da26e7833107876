//! Checkout totals, shipping validation and order placement.
//!
//! Checkout is a two-step flow: shipping details, then payment method. No
//! payment is processed and nothing is sent to a server; placing an order
//! clears the local cart and produces an [`OrderConfirmation`].

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cart::{CartStorage, CartStore};
use crate::types::Price;

/// Sales tax, in percent of the subtotal.
pub const TAX_RATE_PERCENT: i64 = 18;

/// Prefix of generated order numbers.
pub const ORDER_ID_PREFIX: &str = "ORD";

/// Subtotal, tax and grand total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute tax on `subtotal`.
    ///
    /// Only the tax is rounded (to whole units, half away from zero); the
    /// total is `subtotal + tax` as-is.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = subtotal
            .saturating_mul(Decimal::new(TAX_RATE_PERCENT, 2))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal,
            tax,
            total: subtotal.saturating_add(tax),
        }
    }

    #[must_use]
    pub fn subtotal_price(&self) -> Price {
        Price::inr(self.subtotal)
    }

    #[must_use]
    pub fn tax_price(&self) -> Price {
        Price::inr(self.tax)
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::inr(self.total)
    }
}

/// A required shipping form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShippingField {
    FullName,
    Email,
    Phone,
    Address,
    City,
    State,
    Pincode,
}

impl ShippingField {
    /// All fields in form order.
    pub const ALL: [Self; 7] = [
        Self::FullName,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::City,
        Self::State,
        Self::Pincode,
    ];

    /// Form input name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Pincode => "pincode",
        }
    }

    /// Message shown when the field is left blank.
    #[must_use]
    pub const fn required_message(self) -> &'static str {
        match self {
            Self::FullName => "Full name is required",
            Self::Email => "Email is required",
            Self::Phone => "Phone number is required",
            Self::Address => "Address is required",
            Self::City => "City is required",
            Self::State => "State is required",
            Self::Pincode => "Pincode is required",
        }
    }
}

/// Shipping form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

impl ShippingDetails {
    /// The current value of a field.
    #[must_use]
    pub fn value(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::FullName => &self.full_name,
            ShippingField::Email => &self.email,
            ShippingField::Phone => &self.phone,
            ShippingField::Address => &self.address,
            ShippingField::City => &self.city,
            ShippingField::State => &self.state,
            ShippingField::Pincode => &self.pincode,
        }
    }

    fn value_mut(&mut self, field: ShippingField) -> &mut String {
        match field {
            ShippingField::FullName => &mut self.full_name,
            ShippingField::Email => &mut self.email,
            ShippingField::Phone => &mut self.phone,
            ShippingField::Address => &mut self.address,
            ShippingField::City => &mut self.city,
            ShippingField::State => &mut self.state,
            ShippingField::Pincode => &mut self.pincode,
        }
    }

    /// Check that every field is non-blank.
    ///
    /// # Errors
    ///
    /// Returns one error message per blank field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let errors = FieldErrors(
            ShippingField::ALL
                .into_iter()
                .filter(|field| self.value(*field).trim().is_empty())
                .map(|field| (field, field.required_message()))
                .collect(),
        );

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Per-field validation messages, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(ShippingField, &'static str)>);

impl FieldErrors {
    #[must_use]
    pub fn get(&self, field: ShippingField) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| *message)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    fn clear_field(&mut self, field: ShippingField) {
        self.0.retain(|(f, _)| *f != field);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.0.iter().map(|(_, message)| *message).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// How the shopper intends to pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    Cod,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::Card, Self::Upi, Self::Cod];

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Cod => "cod",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::Upi => "UPI",
            Self::Cod => "Cash on Delivery",
        }
    }
}

/// Which form the shopper is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
}

impl CheckoutStep {
    /// 1-based step number for the progress indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
        }
    }
}

/// In-progress checkout form state.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    step: CheckoutStep,
    shipping: ShippingDetails,
    payment: PaymentMethod,
    errors: FieldErrors,
}

impl Checkout {
    /// Resume a checkout at the shipping step with the given details.
    #[must_use]
    pub fn with_shipping(shipping: ShippingDetails) -> Self {
        Self {
            shipping,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingDetails {
        &self.shipping
    }

    #[must_use]
    pub const fn payment(&self) -> PaymentMethod {
        self.payment
    }

    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Edit a field, clearing any error shown for it.
    pub fn set_field(&mut self, field: ShippingField, value: impl Into<String>) {
        *self.shipping.value_mut(field) = value.into();
        self.errors.clear_field(field);
    }

    pub const fn set_payment(&mut self, payment: PaymentMethod) {
        self.payment = payment;
    }

    /// Move from shipping to payment if the shipping details are complete.
    ///
    /// Returns whether the step advanced. On failure the per-field errors are
    /// available from [`Checkout::errors`].
    pub fn advance(&mut self) -> bool {
        if self.step == CheckoutStep::Payment {
            return true;
        }

        match self.shipping.validate() {
            Ok(()) => {
                self.errors = FieldErrors::default();
                self.step = CheckoutStep::Payment;
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }

    /// Return to the shipping step.
    pub const fn back(&mut self) {
        self.step = CheckoutStep::Shipping;
    }
}

/// Payload handed to the order confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub order_total: Decimal,
    pub order_date: DateTime<Utc>,
}

impl OrderConfirmation {
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::inr(self.order_total)
    }
}

/// Order number for an order placed at `now`: prefix plus unix milliseconds.
///
/// Not globally unique; two orders in the same millisecond collide.
#[must_use]
pub fn order_id(now: DateTime<Utc>) -> String {
    format!("{ORDER_ID_PREFIX}{}", now.timestamp_millis())
}

/// Errors that prevent an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Shipping details are incomplete.
    #[error("invalid shipping details: {0}")]
    Invalid(#[from] FieldErrors),
}

/// Place the order for everything in the cart.
///
/// Validates shipping, computes the total, clears the cart and returns the
/// confirmation payload. A failure to persist the emptied cart is logged and
/// does not fail the order.
///
/// # Errors
///
/// Returns an error if the cart is empty or shipping details are incomplete.
pub fn place_order<S: CartStorage>(
    store: &mut CartStore<S>,
    shipping: &ShippingDetails,
    now: DateTime<Utc>,
) -> Result<OrderConfirmation, CheckoutError> {
    if store.cart().is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    shipping.validate()?;

    let totals = store.cart().totals();
    let confirmation = OrderConfirmation {
        order_id: order_id(now),
        order_total: totals.total,
        order_date: now,
    };

    if let Err(e) = store.clear() {
        warn!(error = %e, order_id = %confirmation.order_id, "Failed to persist cleared cart");
    }

    info!(
        order_id = %confirmation.order_id,
        total = %confirmation.order_total,
        "Order placed"
    );
    Ok(confirmation)
}
