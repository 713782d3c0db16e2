//! Printable quotation of the customer's cart.
//!
//! Rendered as standalone HTML meant to be printed or saved as PDF from the
//! browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use sml_market_core::{Party, Quotation, format_thb};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::quotation::build_quotation;
use crate::state::AppState;

/// Quotation line display data for templates.
#[derive(Clone)]
pub struct QuotationLineView {
    pub no: usize,
    pub code: String,
    pub description: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: String,
    pub amount: String,
}

/// Quotation page template.
#[derive(Template, WebTemplate)]
#[template(path = "quotation.html")]
pub struct QuotationTemplate {
    pub number: String,
    pub issued_on: String,
    pub valid_until: String,
    pub seller: Party,
    pub customer: Party,
    pub lines: Vec<QuotationLineView>,
    pub subtotal: String,
    pub vat: String,
    pub total: String,
    pub terms: Vec<String>,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

impl From<Quotation> for QuotationTemplate {
    fn from(quotation: Quotation) -> Self {
        Self {
            number: quotation.number.as_str().to_owned(),
            issued_on: format_date(quotation.issued_on),
            valid_until: format_date(quotation.valid_until),
            seller: quotation.seller,
            customer: quotation.customer,
            lines: quotation
                .lines
                .into_iter()
                .map(|line| QuotationLineView {
                    no: line.no,
                    code: line.code,
                    description: line.description,
                    quantity: line.quantity,
                    unit: line.unit,
                    unit_price: format_thb(line.unit_price),
                    amount: format_thb(line.amount),
                })
                .collect(),
            subtotal: format_thb(quotation.subtotal),
            vat: format_thb(quotation.vat),
            total: format_thb(quotation.total),
            terms: quotation.terms,
        }
    }
}

/// Render a quotation for everything in the cart.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<QuotationTemplate> {
    let items = state.carts().list(&user.email).await?;
    let issued_on = state.local_date(Utc::now());

    let quotation = build_quotation(&state.config().shop, &user, &items, issued_on)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    tracing::info!(number = %quotation.number.as_str(), lines = quotation.lines.len(), "Quotation issued");
    Ok(quotation.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use sml_market_core::{NewCartItem, QuotationNumber};

    use super::*;

    #[test]
    fn test_template_renders_amounts() {
        let issued_on = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let items = [NewCartItem {
            product_id: "P1".to_owned(),
            name: "Brake pad <XL>".to_owned(),
            code: "BRK-001".to_owned(),
            price: Decimal::from(1_000),
            image: String::new(),
            unit: "set".to_owned(),
            quantity: 2,
        }
        .into_cart_item(Utc::now())];
        let seller = Party {
            name: "SML Market".to_owned(),
            ..Party::default()
        };
        let customer = Party {
            name: "Test User".to_owned(),
            email: "test01@gmail.com".to_owned(),
            ..Party::default()
        };
        let quotation = Quotation::from_cart(
            QuotationNumber::new(issued_on, 7),
            issued_on,
            seller,
            customer,
            &items,
        )
        .unwrap();

        let html = QuotationTemplate::from(quotation).render().unwrap();

        assert!(html.contains("QT20250601-0007"));
        assert!(html.contains("01/06/2025"));
        assert!(html.contains("01/07/2025"));
        assert!(html.contains("฿2,000.00"));
        assert!(html.contains("฿140.00"));
        assert!(html.contains("฿2,140.00"));
        assert!(html.contains("Brake pad &#60;XL&#62;") || html.contains("Brake pad &lt;XL&gt;"));
    }
}
