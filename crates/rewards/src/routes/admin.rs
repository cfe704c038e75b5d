//! Merchant dashboard data.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::Result;
use crate::services::RewardsService;
use crate::state::AppState;

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub shop: String,
}

/// `GET /admin/stats`
///
/// Program-level aggregates for the merchant dashboard.
#[instrument(skip(state), fields(shop = %params.shop))]
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse> {
    let service = RewardsService::new(state.store(), &params.shop);
    let stats = service.shop_stats().await?;

    Ok(Json(json!({ "success": true, "data": stats })))
}
