//! Membership tier configuration and summary aggregates.

use rust_decimal::Decimal;
use serde::Serialize;

use nico_rewards_core::TierId;

use super::{Customer, PendingRedemption, PointTransaction, RedemptionOption};

/// One rung of a merchant's tier ladder. Configured by the merchant,
/// read-only to the core.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipTier {
    pub id: TierId,
    /// Display name; parses case-insensitively into a `TierLevel`.
    pub name: String,
    pub shop: String,
    /// Lifetime-spend threshold for this tier.
    pub min_spent: Decimal,
    /// Cashback fraction (0.02 = 2%).
    pub cashback_rate: Decimal,
    /// Display color for the widget.
    pub color: String,
}

/// Where a customer sits on the tier ladder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgression {
    /// Config row for the customer's current tier, if one matches.
    pub current: Option<MembershipTier>,
    /// Next rung up the ladder, if any.
    pub next: Option<MembershipTier>,
    /// Percent progress toward `next`, clamped to [0, 100].
    /// 100 when the top tier is reached.
    pub progress_to_next: f64,
}

/// Everything the storefront widget shows for a logged-in customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub customer: Customer,
    /// 10 most recent ledger entries, newest first.
    pub transactions: Vec<PointTransaction>,
    /// Redemptions awaiting fulfillment.
    pub pending_redemptions: Vec<PendingRedemption>,
    /// Active options the customer can afford right now, cheapest first.
    pub available_redemptions: Vec<RedemptionOption>,
    pub tier_progression: TierProgression,
}
