//! Domain types for the rewards ledger.
//!
//! These are validated domain objects, kept separate from the database row
//! types in the store layer.

pub mod customer;
pub mod ledger;
pub mod redemption;
pub mod shop;
pub mod tier;

pub use customer::{Customer, CustomerProfile, NewCustomer};
pub use ledger::{NewTransaction, PointTransaction, PurchaseAccrual};
pub use redemption::{PendingRedemption, Redemption, RedemptionOption};
pub use shop::{ShopConfig, ShopStats};
pub use tier::{CustomerSummary, MembershipTier, TierProgression};
