//! Product detail route handler.
//!
//! Product links carry the code as URL-safe base64 (see
//! [`sml_market_core::encode_product_code`]), so codes containing `/` or `#`
//! survive the path. Older links with the plain code still work.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use sml_market_core::{is_valid_product_code, resolve_product_code};

use crate::error::{AppError, Result};
use crate::search::Product;
use crate::state::AppState;

/// Decode a product path segment into a linkable code.
fn code_from_path(encoded: &str) -> Result<String> {
    let code = resolve_product_code(encoded).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !is_valid_product_code(&code) {
        return Err(AppError::BadRequest("invalid product code".to_string()));
    }
    Ok(code)
}

/// Display a single product, matched exactly by code.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(encoded): Path<String>,
) -> Result<Json<Product>> {
    let code = code_from_path(&encoded)?;

    state
        .search()
        .find_by_code(&code)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {code}")))
}
