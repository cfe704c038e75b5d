//! Customer domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use nico_rewards_core::{CustomerId, Email, TierLevel};

/// A rewards program member.
///
/// `total_points` is derived state: it always equals the sum of the
/// customer's point-transaction deltas, and valid operations never drive it
/// negative. `total_spent` is monotonically non-decreasing (no refund
/// clawback in this core).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Internal ID.
    pub id: CustomerId,
    /// Shop-scoped external customer ID (from the storefront platform).
    pub shopify_customer_id: String,
    /// Shop domain this customer belongs to.
    pub shop: String,
    /// Profile email, when the webhook supplied one.
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Current point balance.
    pub total_points: i64,
    /// Lifetime spend, the input to tier resolution.
    pub total_spent: Decimal,
    /// Current membership tier.
    pub membership_tier: TierLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile data supplied on first contact (usually from an order webhook).
#[derive(Debug, Clone, Default)]
pub struct CustomerProfile {
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Insert payload for a new customer: zero balances, lowest tier.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub shopify_customer_id: String,
    pub shop: String,
    pub profile: CustomerProfile,
}
