//! Price representation using decimal arithmetic.
//!
//! All catalog amounts are held as [`Decimal`] in the currency's standard unit
//! (rupees, not paise). [`Price`] pairs an amount with its currency for display.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the storefront's default currency.
    #[must_use]
    pub fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Format for display, e.g. `₹1,180` or `₹1,299.50`.
    ///
    /// Whole amounts are shown without a fractional part; fractional amounts
    /// are rounded to two places.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2).normalize();
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (text.as_str(), None),
        };

        let mut out = String::with_capacity(text.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(self.currency_code.symbol());
        out.push_str(&group_thousands(whole));
        if let Some(fraction) = fraction {
            out.push('.');
            out.push_str(fraction);
            if fraction.len() == 1 {
                out.push('0');
            }
        }
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert `,` separators every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_whole_amounts() {
        assert_eq!(Price::inr(Decimal::new(250, 0)).display(), "₹250");
        assert_eq!(Price::inr(Decimal::new(1180, 0)).display(), "₹1,180");
        assert_eq!(Price::inr(Decimal::new(1_234_567, 0)).display(), "₹1,234,567");
        assert_eq!(Price::inr(Decimal::ZERO).display(), "₹0");
    }

    #[test]
    fn test_display_fractional_amounts() {
        assert_eq!(Price::inr(Decimal::new(129_950, 2)).display(), "₹1,299.50");
        assert_eq!(Price::inr(Decimal::new(9_999, 2)).display(), "₹99.99");
        assert_eq!(Price::inr(Decimal::new(10_000, 2)).display(), "₹100");
    }

    #[test]
    fn test_display_other_currency() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$19.99");
    }
}
