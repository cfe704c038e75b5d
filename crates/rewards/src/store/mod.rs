//! The ledger store: durable keyed storage for the rewards entities.
//!
//! The service layer talks to [`LedgerStore`], an object-safe trait over
//! the abstract transactional store. Two implementations exist:
//!
//! - [`PostgresStore`] - production storage (`rewards` schema, sqlx)
//! - [`MemoryStore`] - in-process storage for tests and local development
//!
//! # Atomicity contract
//!
//! Every trait method is one atomic unit: either all of its sub-operations
//! commit or none do. The methods that touch both the transaction log and a
//! balance ([`record_purchase`](LedgerStore::record_purchase),
//! [`record_signup_bonus`](LedgerStore::record_signup_bonus),
//! [`redeem`](LedgerStore::redeem)) must never leave the two inconsistent,
//! and [`redeem`](LedgerStore::redeem) must apply its debit as a
//! compare-and-set so concurrent redemptions cannot over-spend a balance.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/rewards/migrations/` and run via:
//! ```bash
//! cargo run -p nico-rewards-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use nico_rewards_core::{CustomerId, RedemptionOptionId, TierLevel};

use crate::models::{
    Customer, MembershipTier, NewCustomer, NewTransaction, PendingRedemption, PointTransaction,
    Redemption, RedemptionOption, ShopConfig, ShopStats,
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation: a duplicate unique key, or a compare-and-set
    /// debit that found an insufficient balance at commit time.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// The abstract transactional store behind the rewards ledger.
///
/// All lookups are shop-scoped; implementations must never return or mutate
/// rows belonging to another shop than the one named in the call (methods
/// keyed by internal ID return rows whose shop the caller re-checks).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // Customers

    /// Look up a customer by internal ID.
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Look up a customer by the shop-scoped external key.
    async fn find_customer_by_external(
        &self,
        shop: &str,
        external_id: &str,
    ) -> Result<Option<Customer>, StoreError>;

    /// Create a customer with zero balances and the lowest tier.
    ///
    /// Returns `Conflict` if the `(shopify_customer_id, shop)` key already
    /// exists, so a racing duplicate create can fall back to the winner's
    /// row instead of double-granting the welcome bonus.
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, StoreError>;

    /// Persist a tier change. Returns the updated customer.
    async fn set_customer_tier(
        &self,
        id: CustomerId,
        tier: TierLevel,
    ) -> Result<Customer, StoreError>;

    // Ledger

    /// Atomically append a purchase transaction and increment both
    /// `total_points` (by `tx.points`) and `total_spent` (by `amount`).
    async fn record_purchase(
        &self,
        id: CustomerId,
        tx: NewTransaction,
        amount: Decimal,
    ) -> Result<(PointTransaction, Customer), StoreError>;

    /// Atomically append a signup-bonus transaction and increment
    /// `total_points` by its delta.
    async fn record_signup_bonus(
        &self,
        id: CustomerId,
        tx: NewTransaction,
    ) -> Result<PointTransaction, StoreError>;

    /// The customer's most recent ledger entries, newest first.
    async fn recent_transactions(
        &self,
        id: CustomerId,
        limit: i64,
    ) -> Result<Vec<PointTransaction>, StoreError>;

    // Redemptions

    /// Execute a redemption as one atomic unit: compare-and-set debit of
    /// `option.points_cost` (only if the stored balance still covers it),
    /// append the REDEEMED transaction, insert the PENDING redemption.
    ///
    /// Returns `Conflict` with nothing mutated when the balance no longer
    /// covers the cost - the caller lost a race.
    async fn redeem(
        &self,
        id: CustomerId,
        option: &RedemptionOption,
        tx: NewTransaction,
        expires_at: DateTime<Utc>,
    ) -> Result<Redemption, StoreError>;

    /// Pending redemptions for a customer, with their catalog options.
    async fn pending_redemptions(
        &self,
        id: CustomerId,
    ) -> Result<Vec<PendingRedemption>, StoreError>;

    // Catalog

    /// The shop's tier ladder, ascending by `min_spent`.
    async fn list_tiers(&self, shop: &str) -> Result<Vec<MembershipTier>, StoreError>;

    /// Look up a redemption option by ID.
    async fn find_option(
        &self,
        id: RedemptionOptionId,
    ) -> Result<Option<RedemptionOption>, StoreError>;

    /// Active options costing at most `max_cost` points, cheapest first.
    async fn affordable_options(
        &self,
        shop: &str,
        max_cost: i64,
    ) -> Result<Vec<RedemptionOption>, StoreError>;

    // Configuration & stats

    /// The shop's configuration, created with defaults on first access.
    async fn shop_config(&self, shop: &str) -> Result<ShopConfig, StoreError>;

    /// Dashboard aggregates for a shop.
    async fn shop_stats(&self, shop: &str) -> Result<ShopStats, StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
