//! Account route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use sml_market_core::UserStats;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Order count, amount spent and membership dates.
#[instrument(skip(state, user), fields(user = %user.email))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserStats>> {
    state
        .users()
        .stats(&user.email)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("account".to_string()))
}
