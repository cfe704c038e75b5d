//! Business logic for the rewards ledger.

pub mod rewards;
pub mod tiers;

pub use rewards::{RewardsError, RewardsService};
