//! App-proxy route handlers for the storefront widget.
//!
//! The platform authenticates the shopper upstream and forwards the request
//! with `shop` and `logged_in_customer_id` query parameters; this layer
//! trusts those values.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use nico_rewards_core::RedemptionOptionId;

use crate::error::{AppError, Result};
use crate::services::RewardsService;
use crate::state::AppState;

/// Query parameters the app proxy appends to every forwarded request.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub shop: String,
    /// Set only when a shopper is logged in.
    pub logged_in_customer_id: Option<String>,
}

/// `GET /apps/proxy/customer/summary`
///
/// The widget's data source: the customer record, recent ledger entries,
/// pending redemptions, affordable options, and tier progression. An
/// anonymous shopper gets a successful empty payload rather than an error.
#[instrument(skip(state), fields(shop = %params.shop))]
pub async fn customer_summary(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<impl IntoResponse> {
    let Some(customer_id) = params.logged_in_customer_id else {
        return Ok(Json(json!({
            "success": true,
            "data": null,
            "message": "No customer logged in",
        })));
    };

    let service = RewardsService::new(state.store(), &params.shop);
    let summary = service
        .get_customer_summary(&customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_owned()))?;

    Ok(Json(json!({ "success": true, "data": summary })))
}

/// Redemption request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub option_id: RedemptionOptionId,
}

/// Redemption response envelope.
#[derive(Debug, Serialize)]
pub struct RedeemResponse<T> {
    pub success: bool,
    pub data: T,
}

/// `POST /apps/proxy/customer/redeem`
///
/// Exchanges points for the named option on behalf of the logged-in
/// shopper. Business-rule violations (inactive option, insufficient
/// points) come back as 4xx via `AppError`.
#[instrument(skip(state, body), fields(shop = %params.shop))]
pub async fn redeem(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
    Json(body): Json<RedeemRequest>,
) -> Result<impl IntoResponse> {
    let customer_id = params
        .logged_in_customer_id
        .ok_or_else(|| AppError::BadRequest("customer must be logged in to redeem".to_owned()))?;

    let service = RewardsService::new(state.store(), &params.shop);

    // Redemption never creates a customer: no profile data is passed.
    let shop_config = state.shop_config(&params.shop).await?;
    let customer = service
        .get_or_create_customer(&customer_id, None, &shop_config)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_owned()))?;

    let redemption = service.redeem_points(customer.id, body.option_id).await?;

    Ok(Json(RedeemResponse {
        success: true,
        data: redemption,
    }))
}
