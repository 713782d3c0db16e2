//! SML Market CLI - Order and customer management for operators.
//!
//! # Usage
//!
//! ```bash
//! # List orders, optionally by status
//! sml-cli orders list --status pending
//!
//! # Show one order with its items and timeline
//! sml-cli orders show 250601-0001
//!
//! # Move an order along its lifecycle
//! sml-cli orders set-status 250601-0001 confirmed --note "Stock reserved"
//!
//! # Record negotiated prices
//! sml-cli orders negotiate 250601-0001 --item P1=95.50:"bulk order" --item P2=40
//!
//! # Customers
//! sml-cli users list
//! sml-cli users show buyer@example.com
//! ```
//!
//! The store is selected with the same variables as the storefront
//! (`STORE_BACKEND`, `FIREBASE_DATABASE_URL`, `FIREBASE_AUTH_TOKEN`,
//! `STORE_UTC_OFFSET`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use sml_market_core::{NegotiatedPrice, OrderNumber, OrderStatus};

mod commands;

use commands::orders::parse_negotiated_price;

#[derive(Parser)]
#[command(name = "sml-cli")]
#[command(author, version, about = "SML Market operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Inspect customers
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders, newest first
    List {
        /// Only orders with this status
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Show an order
    Show {
        /// Order number (YYMMDD-NNNN)
        order_number: OrderNumber,
    },
    /// Change an order's status
    SetStatus {
        /// Order number (YYMMDD-NNNN)
        order_number: OrderNumber,

        /// New status (pending, confirmed, processing, shipped, delivered, cancelled)
        status: OrderStatus,

        /// Timeline note (defaults to the status's standard note)
        #[arg(short, long, default_value = "")]
        note: String,

        /// Allow transitions outside the normal lifecycle
        #[arg(long)]
        force: bool,
    },
    /// Record negotiated prices for order items
    Negotiate {
        /// Order number (YYMMDD-NNNN)
        order_number: OrderNumber,

        /// `PRODUCT=PRICE[:REASON]`, repeatable
        #[arg(short, long = "item", required = true, value_parser = parse_negotiated_price)]
        items: Vec<NegotiatedPrice>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List customers by sign-up date
    List,
    /// Show a customer's record and statistics
    Show {
        /// Customer email
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::Store::from_env()?;

    match cli.command {
        Commands::Orders { action } => match action {
            OrderAction::List { status } => commands::orders::list(&store, status).await?,
            OrderAction::Show { order_number } => {
                commands::orders::show(&store, &order_number).await?;
            }
            OrderAction::SetStatus {
                order_number,
                status,
                note,
                force,
            } => {
                commands::orders::set_status(&store, &order_number, status, &note, force).await?;
            }
            OrderAction::Negotiate {
                order_number,
                items,
            } => {
                commands::orders::negotiate(&store, &order_number, &items).await?;
            }
        },
        Commands::Users { action } => match action {
            UserAction::List => commands::users::list(&store).await?,
            UserAction::Show { email } => commands::users::show(&store, &email).await?,
        },
    }
    Ok(())
}
