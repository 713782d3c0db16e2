//! Product search route handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::search::SearchPage;
use crate::state::AppState;

/// Query parameters for search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Search products by free text or code.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPage>> {
    let page = state
        .search()
        .search(&query.q, query.limit, query.offset)
        .await?;
    Ok(Json(page))
}
