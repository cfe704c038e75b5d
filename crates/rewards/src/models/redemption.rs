//! Redemption catalog and redemption record types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use nico_rewards_core::{CustomerId, RedemptionId, RedemptionOptionId, RedemptionStatus, RewardType};

/// Merchant-configured catalog entry. Read-only to the core during
/// redemption.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionOption {
    pub id: RedemptionOptionId,
    pub shop: String,
    pub name: String,
    pub description: String,
    pub points_cost: i64,
    #[serde(rename = "type")]
    pub reward: RewardType,
    /// Discount percentage or fixed amount, depending on `reward`.
    pub value: Decimal,
    pub is_active: bool,
}

/// A point-for-reward exchange, pending downstream fulfillment.
///
/// Immutable after creation except for status transitions owned by the
/// fulfillment collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: RedemptionId,
    pub customer_id: CustomerId,
    pub shop: String,
    pub option_id: RedemptionOptionId,
    pub points_spent: i64,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
    /// 30 days from creation.
    pub expires_at: DateTime<Utc>,
}

/// A pending redemption joined with its catalog option, for summary display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRedemption {
    #[serde(flatten)]
    pub redemption: Redemption,
    pub option: RedemptionOption,
}
