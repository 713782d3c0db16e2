//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use sml_market_core::{Order, OrderNumber};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// The customer's orders, newest first.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().list_for_user(&user.email).await?))
}

/// One of the customer's orders.
///
/// Another customer's order answers 404, the same as a missing one.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    let not_found = || AppError::NotFound(format!("order {order_number}"));

    let number = OrderNumber::parse(&order_number).map_err(|_| not_found())?;
    state
        .orders()
        .get(&number)
        .await?
        .filter(|order| order.belongs_to(&user.email))
        .map(Json)
        .ok_or_else(not_found)
}
