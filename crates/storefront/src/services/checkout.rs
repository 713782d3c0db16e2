//! Checkout: snapshot the cart into a new order.

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use sml_market_core::{Email, Order, OrderError, OrderItem};

use crate::db::{CartRepository, OrderRepository, RepositoryError};

/// Place an order for everything in the customer's cart, then empty it.
///
/// The cart is cleared only after the order is stored. A failure to clear is
/// logged and does not undo the order.
///
/// # Errors
///
/// Returns `RepositoryError::Order(OrderError::Empty)` when the cart is
/// empty, or any error from reading the cart or storing the order.
#[instrument(skip(carts, orders, customer_note), fields(user = %email))]
pub async fn place_order(
    carts: &CartRepository<'_>,
    orders: &OrderRepository<'_>,
    email: &Email,
    customer_note: &str,
    now: DateTime<Utc>,
) -> Result<Order, RepositoryError> {
    let cart = carts.list(email).await?;
    if cart.is_empty() {
        return Err(OrderError::Empty.into());
    }

    let items: Vec<OrderItem> = cart.iter().map(OrderItem::from_cart_item).collect();
    let order = orders
        .create(email, items, customer_note.trim().to_owned(), None, now)
        .await?;

    if let Err(e) = carts.clear(email).await {
        warn!(
            error = %e,
            order_number = %order.order_number,
            "Order placed but cart could not be cleared"
        );
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal::Decimal;

    use sml_market_core::{NewCartItem, OrderStatus};

    use super::*;
    use crate::db::UserRepository;
    use crate::store::Database;

    fn email() -> Email {
        Email::parse("test01@gmail.com").unwrap()
    }

    fn new_item(product_id: &str, price: i64, quantity: u32) -> NewCartItem {
        NewCartItem {
            product_id: product_id.to_owned(),
            name: format!("Product {product_id}"),
            code: product_id.to_owned(),
            price: Decimal::from(price),
            image: String::new(),
            unit: "pcs".to_owned(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_checkout_moves_cart_into_order() {
        let db = Database::memory();
        let carts = CartRepository::new(&db);
        let orders = OrderRepository::new(&db, FixedOffset::east_opt(7 * 3600).unwrap());
        UserRepository::new(&db).upsert(&email(), "Test", Utc::now()).await.unwrap();

        carts.add(&email(), new_item("A", 200, 1), Utc::now()).await.unwrap();
        carts.add(&email(), new_item("B", 120, 5), Utc::now()).await.unwrap();

        let now = Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap();
        let order = place_order(&carts, &orders, &email(), "  leave at door ", now)
            .await
            .unwrap();

        assert_eq!(order.order_number.as_str(), "250601-0001");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_items, 6);
        assert_eq!(order.accepted_total, Decimal::from(800));
        assert_eq!(order.negotiated_total, Decimal::ZERO);
        assert_eq!(order.customer_note, "leave at door");
        assert!(order.items.iter().all(|item| item.price_accepted));

        assert!(carts.list(&email()).await.unwrap().is_empty());
        let stats = UserRepository::new(&db).stats(&email()).await.unwrap().unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_spent, Decimal::from(800));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let db = Database::memory();
        let carts = CartRepository::new(&db);
        let orders = OrderRepository::new(&db, FixedOffset::east_opt(0).unwrap());

        assert!(matches!(
            place_order(&carts, &orders, &email(), "", Utc::now()).await,
            Err(RepositoryError::Order(OrderError::Empty))
        ));
        assert!(orders.list_all().await.unwrap().is_empty());
    }
}
