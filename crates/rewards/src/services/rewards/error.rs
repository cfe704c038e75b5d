//! Rewards service errors.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by the rewards workflows.
///
/// Lookup misses on read paths are returned as `Ok(None)` rather than an
/// error; these variants cover business-rule violations on mutating
/// operations and store failures.
#[derive(Debug, Error)]
pub enum RewardsError {
    /// The customer referenced by a mutating operation does not exist
    /// (or belongs to a different shop).
    #[error("customer not found")]
    CustomerNotFound,

    /// The redemption option does not exist (or belongs to a different shop).
    #[error("redemption option not found")]
    OptionNotFound,

    /// The redemption option is configured but currently inactive.
    #[error("redemption option is not active")]
    OptionInactive,

    /// The customer's balance does not cover the option's cost.
    #[error("insufficient points: have {have}, need {need}")]
    InsufficientPoints {
        /// Balance at validation time.
        have: i64,
        /// The option's point cost.
        need: i64,
    },

    /// A purchase amount was negative.
    #[error("purchase amount cannot be negative")]
    InvalidAmount,

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
