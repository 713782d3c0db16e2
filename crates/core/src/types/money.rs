//! Money helpers.
//!
//! Amounts are Thai baht carried as [`Decimal`]. Prices come from the
//! search API and negotiated overrides; both are kept exact.

use rust_decimal::{Decimal, RoundingStrategy};

/// Value-added tax applied to quotations (7 %).
pub const VAT_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// Format an amount as baht with thousands separators, e.g. `฿1,234.50`.
#[must_use]
pub fn format_thb(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}฿{grouped}.{cents}")
}

/// Serde adapter writing amounts as JSON numbers.
///
/// Stored records keep money as plain numbers. Reading accepts numbers and
/// numeric strings alike.
///
/// ```
/// use rust_decimal::Decimal;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Line {
///     #[serde(with = "sml_market_core::types::money::as_number")]
///     price: Decimal,
/// }
///
/// let json = serde_json::to_value(Line { price: Decimal::new(39050, 2) }).unwrap();
/// assert_eq!(json["price"], 390.5);
/// ```
pub mod as_number {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write `value` as a JSON number.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(value, serializer)
    }

    /// Read a number or a numeric string.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error for anything else.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}
