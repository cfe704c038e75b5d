//! Per-shop configuration and dashboard aggregates.

use serde::Serialize;

/// Shop-scoped tunables, lazily created with defaults on first access.
///
/// Resolved through the store (one row per shop) and cached per shop in
/// [`AppState`](crate::state::AppState); workflows receive it as an explicit
/// argument rather than reaching for global state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConfig {
    pub shop: String,
    /// Points granted once on first customer creation.
    pub welcome_bonus: i64,
}

impl ShopConfig {
    /// Default welcome bonus for newly seen shops.
    pub const DEFAULT_WELCOME_BONUS: i64 = 100;

    /// Defaults for a shop with no stored configuration yet.
    #[must_use]
    pub fn defaults(shop: &str) -> Self {
        Self {
            shop: shop.to_owned(),
            welcome_bonus: Self::DEFAULT_WELCOME_BONUS,
        }
    }
}

/// Merchant-dashboard aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStats {
    pub total_customers: i64,
    /// Sum of positive ledger deltas (points ever awarded).
    pub total_points_awarded: i64,
    pub total_redemptions: i64,
}
