//! Quotations priced from the customer's cart.

use chrono::NaiveDate;
use rand::Rng;

use sml_market_core::{CartItem, Party, Quotation, QuotationError, QuotationNumber};

use crate::models::CurrentUser;

/// Quote `items` for `customer`, issued on `issued_on`.
///
/// The number's 4-digit suffix is random, so two quotations issued the same
/// day can collide; quotations are not stored.
///
/// # Errors
///
/// Returns [`QuotationError::Empty`] for an empty cart.
pub fn build_quotation(
    seller: &Party,
    customer: &CurrentUser,
    items: &[CartItem],
    issued_on: NaiveDate,
) -> Result<Quotation, QuotationError> {
    let suffix = rand::rng().random_range(0..10_000u16);

    let customer = Party {
        name: customer.display_name.clone(),
        email: customer.email.to_string(),
        ..Party::default()
    };

    Quotation::from_cart(
        QuotationNumber::new(issued_on, suffix),
        issued_on,
        seller.clone(),
        customer,
        items,
    )
}
