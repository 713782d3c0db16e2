//! Order management commands.
//!
//! # Usage
//!
//! ```bash
//! sml-cli orders list [--status pending]
//! sml-cli orders show 250601-0001
//! sml-cli orders set-status 250601-0001 shipped [--note "Kerry EX123"] [--force]
//! sml-cli orders negotiate 250601-0001 --item P1=95.50:"bulk order"
//! ```

use std::fmt::Write as _;

use chrono::Utc;
use rust_decimal::Decimal;

use sml_market_core::{NegotiatedPrice, Order, OrderNumber, OrderStatus, format_thb};

use super::{CommandError, Store};

/// Parse a `PRODUCT=PRICE[:REASON]` argument.
///
/// # Errors
///
/// Returns a message if the product is empty or the price is not a
/// non-negative number.
pub fn parse_negotiated_price(arg: &str) -> Result<NegotiatedPrice, String> {
    let (product_id, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT=PRICE[:REASON], got '{arg}'"))?;
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err("product id cannot be empty".to_owned());
    }

    let (price, reason) = rest.split_once(':').unwrap_or((rest, ""));
    let negotiated_price: Decimal = price
        .trim()
        .parse()
        .map_err(|e| format!("invalid price '{price}': {e}"))?;
    if negotiated_price.is_sign_negative() && !negotiated_price.is_zero() {
        return Err(format!("price cannot be negative: {negotiated_price}"));
    }

    Ok(NegotiatedPrice {
        product_id: product_id.to_owned(),
        negotiated_price,
        reason: reason.trim().to_owned(),
    })
}

/// One-line summary of an order.
fn order_row(order: &Order) -> String {
    format!(
        "{}  {:<10}  {}  {:<30}  {:>4} items  {:>14}",
        order.order_number,
        order.status.as_str(),
        order.order_date.format("%Y-%m-%d %H:%M"),
        order.user_email,
        order.total_items,
        format_thb(order.grand_total()),
    )
}

/// Full order with items, totals and timeline.
fn order_detail(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order     {}", order.order_number);
    let _ = writeln!(out, "Customer  {}", order.user_email);
    let _ = writeln!(out, "Status    {}", order.status);
    let _ = writeln!(out, "Placed    {}", order.order_date.to_rfc3339());
    if !order.customer_note.is_empty() {
        let _ = writeln!(out, "Note      {}", order.customer_note);
    }

    let _ = writeln!(out, "\nItems");
    for item in &order.items {
        let price = if item.price_accepted {
            format_thb(item.price)
        } else {
            format!(
                "{} -> {}",
                format_thb(item.price),
                format_thb(item.negotiated_price)
            )
        };
        let _ = writeln!(
            out,
            "  {:<12} {:<36} {:>4} {:<6} {}",
            item.product_id, item.name, item.quantity, item.unit, price
        );
        if !item.negotiation_reason.is_empty() {
            let _ = writeln!(out, "               reason: {}", item.negotiation_reason);
        }
    }

    let _ = writeln!(out, "\nAccepted    {}", format_thb(order.accepted_total));
    let _ = writeln!(out, "Negotiated  {}", format_thb(order.negotiated_total));
    let _ = writeln!(out, "Total       {}", format_thb(order.grand_total()));

    let _ = writeln!(out, "\nTimeline");
    for entry in &order.timeline {
        let _ = writeln!(
            out,
            "  {}  {:<10}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.status.as_str(),
            entry.note
        );
    }
    out
}

/// List orders, optionally filtered by status.
///
/// # Errors
///
/// Returns `CommandError::Repository` if the orders cannot be read.
#[allow(clippy::print_stdout)]
pub async fn list(store: &Store, status: Option<OrderStatus>) -> Result<(), CommandError> {
    let orders = match status {
        Some(status) => store.orders().list_by_status(status).await?,
        None => store.orders().list_all().await?,
    };

    for order in &orders {
        println!("{}", order_row(order));
    }
    tracing::info!("{} order(s)", orders.len());
    Ok(())
}

/// Print one order.
///
/// # Errors
///
/// Returns `CommandError::NotFound` for an unknown order number.
#[allow(clippy::print_stdout)]
pub async fn show(store: &Store, order_number: &OrderNumber) -> Result<(), CommandError> {
    let order = store
        .orders()
        .get(order_number)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("order {order_number}")))?;

    print!("{}", order_detail(&order));
    Ok(())
}

/// Change an order's status.
///
/// # Errors
///
/// Returns `CommandError::Repository` for an unknown order or a transition
/// the lifecycle does not allow (unless `force` is set).
pub async fn set_status(
    store: &Store,
    order_number: &OrderNumber,
    status: OrderStatus,
    note: &str,
    force: bool,
) -> Result<Order, CommandError> {
    let order = store
        .orders()
        .update_status(order_number, status, note, force, Utc::now())
        .await?;

    tracing::info!(
        "Order {} is now {}",
        order.order_number,
        order.status.as_str()
    );
    Ok(order)
}

/// Record negotiated prices on an order.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` when no prices are given and
/// `CommandError::Repository` for an unknown order.
pub async fn negotiate(
    store: &Store,
    order_number: &OrderNumber,
    prices: &[NegotiatedPrice],
) -> Result<Order, CommandError> {
    if prices.is_empty() {
        return Err(CommandError::InvalidArgument(
            "at least one --item is required".to_owned(),
        ));
    }

    let order = store
        .orders()
        .apply_negotiation(order_number, prices, Utc::now())
        .await?;

    tracing::info!(
        "Order {}: accepted {}, negotiated {}, total {}",
        order.order_number,
        format_thb(order.accepted_total),
        format_thb(order.negotiated_total),
        format_thb(order.grand_total())
    );
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use sml_market_core::{Email, NewCartItem, OrderItem};

    use super::*;

    #[test]
    fn test_parse_negotiated_price() {
        let price = parse_negotiated_price("P1=95.50:bulk order").unwrap();
        assert_eq!(price.product_id, "P1");
        assert_eq!(price.negotiated_price, Decimal::new(9550, 2));
        assert_eq!(price.reason, "bulk order");

        let price = parse_negotiated_price(" P2 = 40 ").unwrap();
        assert_eq!(price.product_id, "P2");
        assert_eq!(price.negotiated_price, Decimal::from(40));
        assert!(price.reason.is_empty());

        // Only the first ':' separates the reason
        let price = parse_negotiated_price("P3=10:note: see email").unwrap();
        assert_eq!(price.reason, "note: see email");

        // A free line may be written with a sign
        let price = parse_negotiated_price("P4=-0:sample").unwrap();
        assert!(price.negotiated_price.is_zero());
    }

    #[test]
    fn test_parse_negotiated_price_errors() {
        assert!(parse_negotiated_price("P1").is_err());
        assert!(parse_negotiated_price("=10").is_err());
        assert!(parse_negotiated_price("P1=abc").is_err());
        assert!(parse_negotiated_price("P1=-5").is_err());
        assert!(parse_negotiated_price("P1=-0.01").is_err());
    }

    async fn seed_order(store: &Store) -> Order {
        let item = NewCartItem {
            product_id: "P1".to_owned(),
            name: "Brake pad".to_owned(),
            code: "BRK-001".to_owned(),
            price: Decimal::from(120),
            image: String::new(),
            unit: "set".to_owned(),
            quantity: 5,
        }
        .into_cart_item(Utc::now());

        store
            .orders()
            .create(
                &Email::parse("test01@gmail.com").unwrap(),
                vec![OrderItem::from_cart_item(&item)],
                String::new(),
                None,
                Utc::now(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_status_and_negotiate() {
        let store = Store::memory();
        let order = seed_order(&store).await;

        let updated = set_status(
            &store,
            &order.order_number,
            OrderStatus::Confirmed,
            "",
            false,
        )
        .await
        .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);

        let err = set_status(
            &store,
            &order.order_number,
            OrderStatus::Pending,
            "",
            false,
        )
        .await;
        assert!(matches!(err, Err(CommandError::Repository(_))));

        let prices = [parse_negotiated_price("P1=100:bulk").unwrap()];
        let negotiated = negotiate(&store, &order.order_number, &prices)
            .await
            .unwrap();
        assert_eq!(negotiated.negotiated_total, Decimal::from(500));

        let detail = order_detail(&negotiated);
        assert!(detail.contains("reason: bulk"));
        assert!(detail.contains("฿500.00"));
        assert!(order_row(&negotiated).contains("confirmed"));
    }

    #[tokio::test]
    async fn test_show_unknown_order() {
        let store = Store::memory();
        let number = OrderNumber::parse("250601-0042").unwrap();
        assert!(matches!(
            show(&store, &number).await,
            Err(CommandError::NotFound(_))
        ));
        assert!(matches!(
            negotiate(&store, &number, &[]).await,
            Err(CommandError::InvalidArgument(_))
        ));
    }
}
