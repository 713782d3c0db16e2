//! Cart and order line items, and the totals computed over them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors raised when validating a cart line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartItemError {
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Unit price cannot be negative.
    #[error("price cannot be negative")]
    NegativePrice,
    /// Product id is required.
    #[error("product id cannot be empty")]
    MissingProductId,
}

/// A product the customer wants to put in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(with = "crate::types::money::as_number")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: u32,
}

impl NewCartItem {
    /// Check the line before it is written.
    ///
    /// # Errors
    ///
    /// Returns the first [`CartItemError`] found.
    pub fn validate(&self) -> Result<(), CartItemError> {
        if self.product_id.trim().is_empty() {
            return Err(CartItemError::MissingProductId);
        }
        if self.quantity == 0 {
            return Err(CartItemError::ZeroQuantity);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(CartItemError::NegativePrice);
        }
        Ok(())
    }

    /// Stamp the line with its creation time.
    #[must_use]
    pub fn into_cart_item(self, now: DateTime<Utc>) -> CartItem {
        CartItem {
            id: None,
            product_id: self.product_id,
            name: self.name,
            code: self.code,
            price: self.price,
            image: self.image,
            unit: self.unit,
            quantity: self.quantity,
            added_at: now,
            updated_at: now,
        }
    }
}

/// A line in a customer's cart.
///
/// `id` is the store key of the line. It is filled in when the cart is read
/// and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(with = "crate::types::money::as_number")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Item count and price total of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: u64,
    #[serde(with = "crate::types::money::as_number")]
    pub total: Decimal,
}

impl CartSummary {
    /// Sum quantities and line totals.
    #[must_use]
    pub fn compute(items: &[CartItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            item_count: acc.item_count + u64::from(item.quantity),
            total: acc.total + item.line_total(),
        })
    }
}

/// A line of a placed order: a cart line frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(with = "crate::types::money::as_number")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: u32,
    #[serde(with = "crate::types::money::as_number")]
    pub subtotal: Decimal,
    pub price_accepted: bool,
    #[serde(default, with = "crate::types::money::as_number")]
    pub negotiated_price: Decimal,
    #[serde(default)]
    pub negotiation_reason: String,
}

impl OrderItem {
    /// Snapshot a cart line at the quoted price.
    #[must_use]
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            code: item.code.clone(),
            price: item.price,
            image: item.image.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            subtotal: item.line_total(),
            price_accepted: true,
            negotiated_price: Decimal::ZERO,
            negotiation_reason: String::new(),
        }
    }

    /// Amount actually charged for this line.
    #[must_use]
    pub fn effective_charge(&self) -> Decimal {
        if self.price_accepted {
            self.subtotal
        } else {
            self.negotiated_price * Decimal::from(self.quantity)
        }
    }
}

/// Totals of an order, always recomputed from its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    /// Sum of quantities.
    pub total_items: u64,
    /// Sum of subtotals of lines at the quoted price.
    #[serde(with = "crate::types::money::as_number")]
    pub accepted_total: Decimal,
    /// Sum of negotiated price times quantity of the other lines.
    #[serde(with = "crate::types::money::as_number")]
    pub negotiated_total: Decimal,
}

impl OrderTotals {
    /// Compute totals from scratch.
    #[must_use]
    pub fn compute(items: &[OrderItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            acc.total_items += u64::from(item.quantity);
            if item.price_accepted {
                acc.accepted_total += item.subtotal;
            } else {
                acc.negotiated_total += item.negotiated_price * Decimal::from(item.quantity);
            }
            acc
        })
    }

    /// Accepted plus negotiated total.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.accepted_total + self.negotiated_total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn order_item(price: i64, quantity: u32, accepted: bool, negotiated: i64) -> OrderItem {
        let price = Decimal::from(price);
        OrderItem {
            product_id: format!("P{price}"),
            name: "Brake pad".to_owned(),
            code: String::new(),
            price,
            image: String::new(),
            unit: "pcs".to_owned(),
            quantity,
            subtotal: price * Decimal::from(quantity),
            price_accepted: accepted,
            negotiated_price: Decimal::from(negotiated),
            negotiation_reason: String::new(),
        }
    }

    fn new_item(quantity: u32) -> NewCartItem {
        NewCartItem {
            product_id: "A-100".to_owned(),
            name: "Oil filter".to_owned(),
            code: "A-100".to_owned(),
            price: Decimal::new(12_550, 2),
            image: String::new(),
            unit: "pcs".to_owned(),
            quantity,
        }
    }

    #[test]
    fn test_mixed_totals() {
        let items = [order_item(100, 2, true, 0), order_item(50, 3, false, 40)];
        let totals = OrderTotals::compute(&items);

        assert_eq!(totals.accepted_total, Decimal::from(200));
        assert_eq!(totals.negotiated_total, Decimal::from(120));
        assert_eq!(totals.total_items, 5);
        assert_eq!(totals.grand_total(), Decimal::from(320));
    }

    #[test]
    fn test_empty_totals() {
        assert_eq!(OrderTotals::compute(&[]), OrderTotals::default());
    }

    #[test]
    fn test_snapshot_from_cart() {
        let cart_item = new_item(3).into_cart_item(Utc::now());
        let item = OrderItem::from_cart_item(&cart_item);

        assert!(item.price_accepted);
        assert_eq!(item.subtotal, Decimal::new(37_650, 2));
        assert_eq!(item.negotiated_price, Decimal::ZERO);
        assert_eq!(item.effective_charge(), item.subtotal);
    }

    #[test]
    fn test_cart_summary() {
        let now = Utc::now();
        let items = [new_item(2).into_cart_item(now), new_item(1).into_cart_item(now)];
        let summary = CartSummary::compute(&items);

        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total, Decimal::new(37_650, 2));
    }

    #[test]
    fn test_validate() {
        assert!(new_item(1).validate().is_ok());
        assert_eq!(new_item(0).validate(), Err(CartItemError::ZeroQuantity));

        let mut negative = new_item(1);
        negative.price = Decimal::from(-1);
        assert_eq!(negative.validate(), Err(CartItemError::NegativePrice));

        let mut unnamed = new_item(1);
        unnamed.product_id = "  ".to_owned();
        assert_eq!(unnamed.validate(), Err(CartItemError::MissingProductId));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let item = order_item(100, 2, false, 90);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["productId"], "P100");
        assert_eq!(json["priceAccepted"], false);
        assert!(json.get("negotiatedPrice").is_some());
    }

    #[test]
    fn test_reads_numeric_prices() {
        let json = serde_json::json!({
            "productId": "X1",
            "name": "Spark plug",
            "code": "X1",
            "price": 100,
            "image": "",
            "unit": "pcs",
            "quantity": 2,
            "subtotal": 200,
            "priceAccepted": true,
            "negotiatedPrice": 0,
            "negotiationReason": ""
        });
        let item: OrderItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.subtotal, Decimal::from(200));
    }

    fn arb_item() -> impl Strategy<Value = OrderItem> {
        (0i64..100_000, 1u32..1_000, any::<bool>(), 0i64..100_000)
            .prop_map(|(price, qty, accepted, negotiated)| {
                order_item(price, qty, accepted, negotiated)
            })
    }

    proptest! {
        #[test]
        fn prop_total_items_is_sum_of_quantities(items in prop::collection::vec(arb_item(), 0..20)) {
            let totals = OrderTotals::compute(&items);
            let expected: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
            prop_assert_eq!(totals.total_items, expected);
        }

        #[test]
        fn prop_grand_total_is_sum_of_charges(items in prop::collection::vec(arb_item(), 0..20)) {
            let totals = OrderTotals::compute(&items);
            let expected: Decimal = items.iter().map(OrderItem::effective_charge).sum();
            prop_assert_eq!(totals.grand_total(), expected);
        }
    }
}
