//! Customer inspection commands.

use sml_market_core::{Email, User, format_thb};

use super::{CommandError, Store};

fn user_row(user: &User) -> String {
    format!(
        "{:<32}  {:<24}  {:>4} orders  {:>14}  since {}",
        user.email,
        user.display_name,
        user.total_orders,
        format_thb(user.total_spent),
        user.created_at.format("%Y-%m-%d"),
    )
}

/// List all customers.
///
/// # Errors
///
/// Returns `CommandError::Repository` if the users cannot be read.
#[allow(clippy::print_stdout)]
pub async fn list(store: &Store) -> Result<(), CommandError> {
    let users = store.users().list().await?;
    for user in &users {
        println!("{}", user_row(user));
    }
    tracing::info!("{} user(s)", users.len());
    Ok(())
}

/// Print one customer with their order statistics.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` for a malformed email and
/// `CommandError::NotFound` for an unknown customer.
#[allow(clippy::print_stdout)]
pub async fn show(store: &Store, email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    let user = store
        .users()
        .get(&email)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("user {email}")))?;
    let orders = store.orders().list_for_user(&email).await?;

    println!("Email         {}", user.email);
    println!("Name          {}", user.display_name);
    println!("Member since  {}", user.created_at.to_rfc3339());
    println!("Last login    {}", user.last_login.to_rfc3339());
    println!("Orders        {}", user.total_orders);
    println!("Spent         {}", format_thb(user.total_spent));
    for order in &orders {
        println!(
            "  {}  {:<10}  {}",
            order.order_number,
            order.status.as_str(),
            format_thb(order.grand_total())
        );
    }
    Ok(())
}
