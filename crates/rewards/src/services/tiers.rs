//! Pure tier math: resolution, cashback lookup, and ladder progression.
//!
//! All functions take the shop's tier ladder in ascending `min_spent` order,
//! as returned by [`LedgerStore::list_tiers`](crate::store::LedgerStore::list_tiers).

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use nico_rewards_core::TierLevel;

use crate::models::{Customer, MembershipTier, TierProgression};

/// Cashback fraction used when no configured tier matches the customer's
/// level (lenient fallback, 1%).
#[must_use]
pub fn default_cashback_rate() -> Decimal {
    Decimal::new(1, 2)
}

/// Resolve the tier a customer's lifetime spend entitles them to.
///
/// Tiers are evaluated from the highest threshold down; the first rung whose
/// `min_spent` is covered wins. An empty or unmatched ladder resolves to the
/// lowest configured rung, or `Bronze` when nothing is configured. Pure and
/// monotonic: for a fixed ladder, more spend never resolves to a lower tier.
#[must_use]
pub fn resolve_tier(tiers: &[MembershipTier], total_spent: Decimal) -> TierLevel {
    for tier in tiers.iter().rev() {
        if tier.min_spent <= total_spent
            && let Ok(level) = tier.name.parse()
        {
            return level;
        }
    }

    tiers
        .first()
        .and_then(|t| t.name.parse().ok())
        .unwrap_or_default()
}

/// Cashback rate for a tier level.
///
/// Falls back to 1% when the ladder has no rung matching `level` - a
/// misconfiguration the accrual path tolerates rather than surfaces.
#[must_use]
pub fn cashback_rate_for(tiers: &[MembershipTier], level: TierLevel) -> Decimal {
    match tiers.iter().find(|t| t.name.parse().ok() == Some(level)) {
        Some(tier) => tier.cashback_rate,
        None => {
            tracing::warn!(tier = %level, "no tier configuration for level, using default rate");
            default_cashback_rate()
        }
    }
}

/// Where a customer sits on the ladder: current rung, next rung, and
/// percent progress toward it.
///
/// The percentage is clamped to [0, 100]. A customer on the top rung - or a
/// degenerate ladder where two rungs share a threshold - reports 100 rather
/// than dividing by zero.
#[must_use]
pub fn tier_progression(tiers: &[MembershipTier], customer: &Customer) -> TierProgression {
    let current_index = tiers
        .iter()
        .position(|t| t.name.parse().ok() == Some(customer.membership_tier));

    let current = current_index.and_then(|i| tiers.get(i)).cloned();
    let next = current_index.and_then(|i| tiers.get(i + 1)).cloned();

    let progress_to_next = match (&current, &next) {
        (Some(cur), Some(next)) => {
            let span = next.min_spent - cur.min_spent;
            if span <= Decimal::ZERO {
                100.0
            } else {
                let ratio = (customer.total_spent - cur.min_spent) / span;
                (ratio.to_f64().unwrap_or(1.0) * 100.0).clamp(0.0, 100.0)
            }
        }
        _ => 100.0,
    };

    TierProgression {
        current,
        next,
        progress_to_next,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use nico_rewards_core::TierId;

    use super::*;

    fn tier(id: i32, name: &str, min_spent: i64, rate_bp: i64) -> MembershipTier {
        MembershipTier {
            id: TierId::new(id),
            name: name.to_owned(),
            shop: "demo.myshopify.com".to_owned(),
            min_spent: Decimal::from(min_spent),
            cashback_rate: Decimal::new(rate_bp, 4),
            color: "#CD7F32".to_owned(),
        }
    }

    fn demo_ladder() -> Vec<MembershipTier> {
        vec![
            tier(1, "Bronze", 0, 100),
            tier(2, "Silver", 500, 200),
            tier(3, "Gold", 1000, 300),
        ]
    }

    #[test]
    fn resolves_highest_covered_rung() {
        let ladder = demo_ladder();
        assert_eq!(resolve_tier(&ladder, Decimal::ZERO), TierLevel::Bronze);
        assert_eq!(resolve_tier(&ladder, Decimal::from(499)), TierLevel::Bronze);
        assert_eq!(resolve_tier(&ladder, Decimal::from(500)), TierLevel::Silver);
        assert_eq!(resolve_tier(&ladder, Decimal::from(999)), TierLevel::Silver);
        assert_eq!(resolve_tier(&ladder, Decimal::from(5000)), TierLevel::Gold);
    }

    #[test]
    fn empty_ladder_defaults_to_bronze() {
        assert_eq!(resolve_tier(&[], Decimal::from(10_000)), TierLevel::Bronze);
    }

    #[test]
    fn cashback_rate_falls_back_to_one_percent() {
        let ladder = vec![tier(1, "Bronze", 0, 100)];
        assert_eq!(
            cashback_rate_for(&ladder, TierLevel::Gold),
            default_cashback_rate()
        );
        assert_eq!(
            cashback_rate_for(&demo_ladder(), TierLevel::Silver),
            Decimal::new(200, 4)
        );
    }

    fn customer_with(spend: i64, level: TierLevel) -> Customer {
        use chrono::Utc;
        use nico_rewards_core::CustomerId;

        Customer {
            id: CustomerId::new(1),
            shopify_customer_id: "1001".to_owned(),
            shop: "demo.myshopify.com".to_owned(),
            email: None,
            first_name: None,
            last_name: None,
            total_points: 0,
            total_spent: Decimal::from(spend),
            membership_tier: level,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn progression_reports_halfway_point() {
        let ladder = demo_ladder();
        let progression = tier_progression(&ladder, &customer_with(250, TierLevel::Bronze));
        assert!((progression.progress_to_next - 50.0).abs() < f64::EPSILON);
        assert_eq!(
            progression.next.map(|t| t.name),
            Some("Silver".to_owned())
        );
    }

    #[test]
    fn top_rung_reports_full_progress() {
        let ladder = demo_ladder();
        let progression = tier_progression(&ladder, &customer_with(2_000, TierLevel::Gold));
        assert!(progression.next.is_none());
        assert!((progression.progress_to_next - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_threshold_ladder_clamps_instead_of_dividing_by_zero() {
        let ladder = vec![tier(1, "Bronze", 0, 100), tier(2, "Silver", 0, 200)];
        let progression = tier_progression(&ladder, &customer_with(0, TierLevel::Bronze));
        assert!((progression.progress_to_next - 100.0).abs() < f64::EPSILON);
    }

    proptest! {
        /// For a fixed ladder, more spend never resolves to a lower tier.
        #[test]
        fn resolve_tier_is_monotonic(
            silver_min in 1_i64..10_000,
            gold_gap in 1_i64..10_000,
            spend_a in 0_i64..50_000,
            spend_b in 0_i64..50_000,
        ) {
            let ladder = vec![
                tier(1, "Bronze", 0, 100),
                tier(2, "Silver", silver_min, 200),
                tier(3, "Gold", silver_min + gold_gap, 300),
            ];

            let (lo, hi) = if spend_a <= spend_b {
                (spend_a, spend_b)
            } else {
                (spend_b, spend_a)
            };

            let lower = resolve_tier(&ladder, Decimal::from(lo));
            let higher = resolve_tier(&ladder, Decimal::from(hi));
            prop_assert!(lower <= higher);
        }
    }
}
