//! Order numbers and the per-day counter key.
//!
//! An order number is the truncated order date followed by that day's
//! sequence counter, e.g. `250601-0008` for the eighth order on 2025-06-01.
//! The counter lives at `counters/orderNumber/{DateKey}` in the store.

use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Minimum width of the sequence suffix. Larger counters widen the field.
const SEQUENCE_WIDTH: usize = 4;

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// Not of the form `YYMMDD-NNNN`.
    #[error("malformed order number: {0}")]
    Malformed(String),
}

/// Per-day counter key in `YYMMDD` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    /// Build the key for a calendar date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!(
            "{:02}{:02}{:02}",
            date.year().rem_euclid(100),
            date.month(),
            date.day()
        ))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable order identifier, `{YY}{MM}{DD}-{sequence}`.
///
/// ```
/// use chrono::NaiveDate;
/// use sml_market_core::OrderNumber;
///
/// let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// assert_eq!(OrderNumber::generate(date, 8).as_str(), "250601-0008");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Format the order number for the `counter`-th order of `date`.
    ///
    /// Counters above 9999 are not rejected; the suffix simply grows wider.
    #[must_use]
    pub fn generate(date: NaiveDate, counter: u64) -> Self {
        Self(format!(
            "{}-{counter:0width$}",
            DateKey::from_date(date),
            width = SEQUENCE_WIDTH
        ))
    }

    /// Parse an order number received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError::Malformed`] unless the input is six digits,
    /// a hyphen, and at least four digits.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let malformed = || OrderNumberError::Malformed(s.to_owned());
        let (date, sequence) = s.split_once('-').ok_or_else(malformed)?;

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if date.len() != 6 || !all_digits(date) {
            return Err(malformed());
        }
        if sequence.len() < SEQUENCE_WIDTH || !all_digits(sequence) {
            return Err(malformed());
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `YYMMDD` prefix.
    #[must_use]
    pub fn date_key(&self) -> &str {
        self.0.split_once('-').map_or("", |(date, _)| date)
    }

    /// The numeric sequence suffix.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        self.0
            .split_once('-')
            .and_then(|(_, seq)| seq.parse().ok())
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_key() {
        assert_eq!(DateKey::from_date(date(2025, 6, 1)).as_str(), "250601");
        assert_eq!(DateKey::from_date(date(2009, 12, 31)).as_str(), "091231");
        assert_eq!(DateKey::from_date(date(2100, 1, 5)).as_str(), "000105");
    }

    #[test]
    fn test_next_after_seven() {
        let number = OrderNumber::generate(date(2025, 6, 1), 7 + 1);
        assert_eq!(number.as_str(), "250601-0008");
    }

    #[test]
    fn test_first_order_of_day() {
        let number = OrderNumber::generate(date(2024, 2, 29), 1);
        assert_eq!(number.as_str(), "240229-0001");
    }

    #[test]
    fn test_counter_overflows_padding() {
        let number = OrderNumber::generate(date(2025, 6, 1), 10_000);
        assert_eq!(number.as_str(), "250601-10000");
        assert_eq!(number.sequence(), Some(10_000));
    }

    #[test]
    fn test_parse() {
        let number = OrderNumber::parse("250601-0008").unwrap();
        assert_eq!(number.date_key(), "250601");
        assert_eq!(number.sequence(), Some(8));

        assert!(OrderNumber::parse("250601-12345").is_ok());
        assert!(OrderNumber::parse("250601").is_err());
        assert!(OrderNumber::parse("2506-0008").is_err());
        assert!(OrderNumber::parse("250601-008").is_err());
        assert!(OrderNumber::parse("../orders").is_err());
        assert!(OrderNumber::parse("25o601-0008").is_err());
    }

    proptest! {
        #[test]
        fn prop_suffix_is_counter(counter in 1u64..1_000_000) {
            let number = OrderNumber::generate(date(2025, 6, 1), counter);
            prop_assert_eq!(number.sequence(), Some(counter));

            let suffix = number.as_str().split_once('-').unwrap().1.to_owned();
            prop_assert_eq!(suffix.len(), counter.to_string().len().max(SEQUENCE_WIDTH));
            prop_assert!(OrderNumber::parse(number.as_str()).is_ok());
        }
    }
}
