//! Price quotations built from a cart.

use core::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{CartItem, VAT_RATE};

/// Days a quotation stays valid.
pub const VALIDITY_DAYS: i64 = 30;

/// Standard terms printed on every quotation.
pub const STANDARD_TERMS: [&str; 4] = [
    "Prices include delivery within the Bangkok metropolitan area.",
    "Payment due within 30 days of invoice.",
    "Prices are subject to stock availability at time of order.",
    "Quotation valid for 30 days from the date of issue.",
];

/// Errors raised when building a quotation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotationError {
    /// Nothing to quote.
    #[error("cannot quote an empty cart")]
    Empty,
}

/// Quotation number, `QT{YYYYMMDD}-{NNNN}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotationNumber(String);

impl QuotationNumber {
    /// Build a quotation number from the issue date and a 4-digit suffix.
    ///
    /// Suffixes above 9999 are reduced modulo 10000.
    #[must_use]
    pub fn new(issued_on: NaiveDate, suffix: u16) -> Self {
        Self(format!(
            "QT{:04}{:02}{:02}-{:04}",
            issued_on.year(),
            issued_on.month(),
            issued_on.day(),
            suffix % 10_000
        ))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuotationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named party on the quotation (seller or customer).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tax_id: String,
}

/// One row of the quotation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationLine {
    pub no: usize,
    pub code: String,
    pub description: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// A priced quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub number: QuotationNumber,
    pub issued_on: NaiveDate,
    pub valid_until: NaiveDate,
    pub seller: Party,
    pub customer: Party,
    pub lines: Vec<QuotationLine>,
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
    pub terms: Vec<String>,
}

impl Quotation {
    /// Quote the given cart lines.
    ///
    /// VAT is rounded to satang (two decimal places, half away from zero).
    ///
    /// # Errors
    ///
    /// Returns [`QuotationError::Empty`] when `items` is empty.
    pub fn from_cart(
        number: QuotationNumber,
        issued_on: NaiveDate,
        seller: Party,
        customer: Party,
        items: &[CartItem],
    ) -> Result<Self, QuotationError> {
        if items.is_empty() {
            return Err(QuotationError::Empty);
        }

        let lines: Vec<QuotationLine> = items
            .iter()
            .enumerate()
            .map(|(i, item)| QuotationLine {
                no: i + 1,
                code: item.code.clone(),
                description: item.name.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                unit_price: item.price,
                amount: item.line_total(),
            })
            .collect();

        let subtotal: Decimal = lines.iter().map(|line| line.amount).sum();
        let vat = (subtotal * VAT_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Ok(Self {
            number,
            issued_on,
            valid_until: issued_on + Duration::days(VALIDITY_DAYS),
            seller,
            customer,
            lines,
            subtotal,
            vat,
            total: subtotal + vat,
            terms: STANDARD_TERMS.iter().map(|t| (*t).to_owned()).collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::NewCartItem;

    fn cart_item(code: &str, price: Decimal, quantity: u32) -> CartItem {
        NewCartItem {
            product_id: code.to_owned(),
            name: format!("Part {code}"),
            code: code.to_owned(),
            price,
            image: String::new(),
            unit: "pcs".to_owned(),
            quantity,
        }
        .into_cart_item(Utc::now())
    }

    fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_number_format() {
        assert_eq!(
            QuotationNumber::new(issue_date(), 42).as_str(),
            "QT20250601-0042"
        );
        assert_eq!(
            QuotationNumber::new(issue_date(), 12_345).as_str(),
            "QT20250601-2345"
        );
    }

    #[test]
    fn test_totals_with_vat() {
        let items = [
            cart_item("A", Decimal::from(100), 2),
            cart_item("B", Decimal::new(3_350, 2), 3),
        ];
        let quotation = Quotation::from_cart(
            QuotationNumber::new(issue_date(), 1),
            issue_date(),
            Party::default(),
            Party::default(),
            &items,
        )
        .unwrap();

        assert_eq!(quotation.lines.len(), 2);
        assert_eq!(quotation.lines[1].no, 2);
        assert_eq!(quotation.lines[1].amount, Decimal::new(10_050, 2));
        assert_eq!(quotation.subtotal, Decimal::new(30_050, 2));
        // 300.50 * 0.07 = 21.035 -> 21.04
        assert_eq!(quotation.vat, Decimal::new(2_104, 2));
        assert_eq!(quotation.total, Decimal::new(32_154, 2));
        assert_eq!(
            quotation.valid_until,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
        assert_eq!(quotation.terms.len(), STANDARD_TERMS.len());
    }

    #[test]
    fn test_empty_cart() {
        let result = Quotation::from_cart(
            QuotationNumber::new(issue_date(), 1),
            issue_date(),
            Party::default(),
            Party::default(),
            &[],
        );
        assert_eq!(result.unwrap_err(), QuotationError::Empty);
    }
}
