//! Enums for the rewards ledger.
//!
//! These mirror the TEXT columns in the rewards database. The store layer
//! round-trips them through [`as_str`](TierLevel::as_str) / `FromStr` so an
//! unexpected stored value surfaces as a data-corruption error instead of
//! panicking.

use serde::{Deserialize, Serialize};

/// Error returned when a stored enum value does not match any known variant.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownEnumValue {
    /// Which enum failed to parse (e.g. "tier level").
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// Spend-based membership tier.
///
/// The derive order gives `Bronze < Silver < Gold`, which is the ladder
/// order used by tier resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierLevel {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl TierLevel {
    /// Canonical database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
        }
    }
}

impl std::str::FromStr for TierLevel {
    type Err = UnknownEnumValue;

    /// Case-insensitive: merchant tier configuration stores display names
    /// like "Bronze" while the customer column stores "BRONZE".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BRONZE" => Ok(Self::Bronze),
            "SILVER" => Ok(Self::Silver),
            "GOLD" => Ok(Self::Gold),
            _ => Err(UnknownEnumValue {
                kind: "tier level",
                value: s.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for TierLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a point-ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Cashback points from a paid order.
    EarnedPurchase,
    /// One-time welcome bonus on customer creation.
    EarnedSignup,
    /// Points spent on a redemption (negative delta).
    Redeemed,
    /// Manual merchant adjustment.
    Adjusted,
}

impl TransactionType {
    /// Canonical database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarnedPurchase => "EARNED_PURCHASE",
            Self::EarnedSignup => "EARNED_SIGNUP",
            Self::Redeemed => "REDEEMED",
            Self::Adjusted => "ADJUSTED",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EARNED_PURCHASE" => Ok(Self::EarnedPurchase),
            "EARNED_SIGNUP" => Ok(Self::EarnedSignup),
            "REDEEMED" => Ok(Self::Redeemed),
            "ADJUSTED" => Ok(Self::Adjusted),
            _ => Err(UnknownEnumValue {
                kind: "transaction type",
                value: s.to_owned(),
            }),
        }
    }
}

/// Lifecycle of a redemption.
///
/// This core only ever writes `Pending`; the terminal transitions belong to
/// the downstream fulfillment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionStatus {
    #[default]
    Pending,
    Fulfilled,
    Expired,
}

impl RedemptionStatus {
    /// Canonical database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Fulfilled => "FULFILLED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::str::FromStr for RedemptionStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "FULFILLED" => Ok(Self::Fulfilled),
            "EXPIRED" => Ok(Self::Expired),
            _ => Err(UnknownEnumValue {
                kind: "redemption status",
                value: s.to_owned(),
            }),
        }
    }
}

/// What a redemption option grants when fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    PercentageDiscount,
    FixedDiscount,
    FreeShipping,
}

impl RewardType {
    /// Canonical database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PercentageDiscount => "PERCENTAGE_DISCOUNT",
            Self::FixedDiscount => "FIXED_DISCOUNT",
            Self::FreeShipping => "FREE_SHIPPING",
        }
    }
}

impl std::str::FromStr for RewardType {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE_DISCOUNT" => Ok(Self::PercentageDiscount),
            "FIXED_DISCOUNT" => Ok(Self::FixedDiscount),
            "FREE_SHIPPING" => Ok(Self::FreeShipping),
            _ => Err(UnknownEnumValue {
                kind: "reward type",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_levels_are_ordered_by_ladder_rank() {
        assert!(TierLevel::Bronze < TierLevel::Silver);
        assert!(TierLevel::Silver < TierLevel::Gold);
        assert_eq!(TierLevel::default(), TierLevel::Bronze);
    }

    #[test]
    fn tier_level_parses_display_names_case_insensitively() {
        assert_eq!("Bronze".parse::<TierLevel>().ok(), Some(TierLevel::Bronze));
        assert_eq!("GOLD".parse::<TierLevel>().ok(), Some(TierLevel::Gold));
        assert!("Platinum".parse::<TierLevel>().is_err());
    }

    #[test]
    fn enums_round_trip_through_canonical_strings() {
        for kind in [
            TransactionType::EarnedPurchase,
            TransactionType::EarnedSignup,
            TransactionType::Redeemed,
            TransactionType::Adjusted,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionType>().ok(), Some(kind));
        }

        for status in [
            RedemptionStatus::Pending,
            RedemptionStatus::Fulfilled,
            RedemptionStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<RedemptionStatus>().ok(), Some(status));
        }

        for reward in [
            RewardType::PercentageDiscount,
            RewardType::FixedDiscount,
            RewardType::FreeShipping,
        ] {
            assert_eq!(reward.as_str().parse::<RewardType>().ok(), Some(reward));
        }
    }
}
