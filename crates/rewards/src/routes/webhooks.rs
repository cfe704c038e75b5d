//! Order webhook ingestion.
//!
//! HMAC signature verification happens upstream (at the platform gateway);
//! this handler trusts the `X-Shopify-Shop-Domain` header it receives.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use nico_rewards_core::Email;

use crate::error::{AppError, Result};
use crate::models::CustomerProfile;
use crate::services::RewardsService;
use crate::state::AppState;

/// The slice of an orders/paid payload this service consumes.
#[derive(Debug, Deserialize)]
pub struct OrderPaidPayload {
    pub id: i64,
    pub customer: Option<OrderCustomer>,
    /// Post-adjustment order total, preferred over `total_price`.
    pub current_total_price: Option<String>,
    pub total_price: Option<String>,
}

/// Customer block inside an order payload.
#[derive(Debug, Deserialize)]
pub struct OrderCustomer {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// `POST /webhooks/orders/paid`
///
/// Resolves (or creates) the rewards customer from the order's customer
/// block, then credits purchase cashback. Orders without a customer are
/// acknowledged and skipped - webhooks must always be answered 200 or the
/// platform retries them.
#[instrument(skip(state, headers, payload), fields(order = payload.id))]
pub async fn orders_paid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrderPaidPayload>,
) -> Result<impl IntoResponse> {
    let shop = headers
        .get("x-shopify-shop-domain")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing shop domain header".to_owned()))?
        .to_owned();

    let Some(order_customer) = payload.customer else {
        tracing::info!(shop, "order has no customer, skipping rewards");
        return Ok(Json(json!({ "success": true, "skipped": true })));
    };

    let amount = payload
        .current_total_price
        .as_deref()
        .or(payload.total_price.as_deref())
        .unwrap_or("0")
        .parse::<Decimal>()
        .map_err(|e| AppError::BadRequest(format!("invalid order total: {e}")))?;

    // A malformed email is dropped from the profile, not a reason to lose
    // the accrual.
    let email = order_customer.email.as_deref().and_then(|raw| {
        Email::parse(raw)
            .map_err(|e| tracing::warn!(error = %e, "ignoring invalid customer email"))
            .ok()
    });

    let profile = CustomerProfile {
        email,
        first_name: order_customer.first_name,
        last_name: order_customer.last_name,
    };

    let service = RewardsService::new(state.store(), &shop);
    let shop_config = state.shop_config(&shop).await?;

    let customer = service
        .get_or_create_customer(&order_customer.id.to_string(), Some(profile), &shop_config)
        .await?
        .ok_or_else(|| AppError::Internal("customer creation returned nothing".to_owned()))?;

    let accrual = service
        .add_points_for_purchase(customer.id, &payload.id.to_string(), amount)
        .await?
        .ok_or_else(|| AppError::Internal("accrual lost its customer".to_owned()))?;

    tracing::info!(
        shop,
        customer = %customer.id,
        points = accrual.points_earned,
        "order processed"
    );

    Ok(Json(json!({
        "success": true,
        "pointsEarned": accrual.points_earned,
    })))
}
