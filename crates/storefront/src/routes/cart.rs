//! Cart and checkout route handlers.
//!
//! Carts live in the document store under the customer's user key, so they
//! survive logout and server restarts.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sml_market_core::{CartItem, CartSummary, NewCartItem, Order, OrderNumber};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::checkout::place_order;
use crate::state::AppState;

/// Cart contents with totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u64,
    #[serde(with = "sml_market_core::types::money::as_number")]
    pub total: Decimal,
}

impl CartView {
    fn new(items: Vec<CartItem>) -> Self {
        let CartSummary { item_count, total } = CartSummary::compute(&items);
        Self {
            items,
            item_count,
            total,
        }
    }
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_note: String,
}

/// Checkout response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_number: OrderNumber,
    pub order: Order,
}

/// Show the cart.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let items = state.carts().list(&user.email).await?;
    Ok(Json(CartView::new(items)))
}

/// Add a product, or increase the quantity of its existing line.
#[instrument(skip(state, user, item), fields(user = %user.email, product_id = %item.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(item): Json<NewCartItem>,
) -> Result<Response> {
    let line = state
        .carts()
        .add_or_increment(&user.email, item, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(line)).into_response())
}

/// Set the quantity of a line.
#[instrument(skip(state, user, body), fields(user = %user.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let carts = state.carts();
    carts
        .update_quantity(&user.email, &id, body.quantity, Utc::now())
        .await?;
    Ok(Json(CartView::new(carts.list(&user.email).await?)))
}

/// Remove a line.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<CartView>> {
    let carts = state.carts();
    carts.remove(&user.email, &id).await?;
    Ok(Json(CartView::new(carts.list(&user.email).await?)))
}

/// Empty the cart.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    state.carts().clear(&user.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Turn the cart into an order.
#[instrument(skip(state, user, body), fields(user = %user.email))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: Option<Json<CheckoutRequest>>,
) -> Result<Response> {
    let body = body.map(|Json(body)| body).unwrap_or_default();

    let order = place_order(
        &state.carts(),
        &state.orders(),
        &user.email,
        &body.customer_note,
        Utc::now(),
    )
    .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", order.order_number.as_str())]),
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_number: order.order_number.clone(),
            order,
        }),
    )
        .into_response())
}
