//! In-memory implementation of the ledger store.
//!
//! Backs the service tests and local development. A single async mutex
//! guards all tables; every trait method holds the lock for its whole unit,
//! which gives the same all-or-nothing semantics as the `PostgreSQL`
//! transactions, and the in-lock balance check in [`redeem`](LedgerStore::redeem)
//! is the compare-and-set.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use nico_rewards_core::{
    CustomerId, RedemptionId, RedemptionOptionId, RedemptionStatus, RewardType, TierId, TierLevel,
    TransactionId,
};

use super::{LedgerStore, StoreError};
use crate::models::{
    Customer, MembershipTier, NewCustomer, NewTransaction, PendingRedemption, PointTransaction,
    Redemption, RedemptionOption, ShopConfig, ShopStats,
};

/// Ledger store held entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    customers: Vec<Customer>,
    transactions: Vec<PointTransaction>,
    tiers: Vec<MembershipTier>,
    options: Vec<RedemptionOption>,
    redemptions: Vec<Redemption>,
    configs: HashMap<String, ShopConfig>,
    next_id: i32,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn push_transaction(&mut self, customer: &Customer, tx: NewTransaction) -> PointTransaction {
        let entry = PointTransaction {
            id: TransactionId::new(self.next_id()),
            customer_id: customer.id,
            shop: customer.shop.clone(),
            points: tx.points,
            kind: tx.kind,
            order_id: tx.order_id,
            amount: tx.amount,
            description: tx.description,
            created_at: Utc::now(),
        };
        self.transactions.push(entry.clone());
        entry
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tier ladder rung, allocating its ID.
    pub async fn seed_tier(
        &self,
        shop: &str,
        name: &str,
        min_spent: Decimal,
        cashback_rate: Decimal,
        color: &str,
    ) -> MembershipTier {
        let mut inner = self.inner.lock().await;
        let tier = MembershipTier {
            id: TierId::new(inner.next_id()),
            name: name.to_owned(),
            shop: shop.to_owned(),
            min_spent,
            cashback_rate,
            color: color.to_owned(),
        };
        inner.tiers.push(tier.clone());
        tier
    }

    /// Insert a redemption option, allocating its ID.
    pub async fn seed_option(
        &self,
        shop: &str,
        name: &str,
        points_cost: i64,
        reward: RewardType,
        value: Decimal,
        is_active: bool,
    ) -> RedemptionOption {
        let mut inner = self.inner.lock().await;
        let option = RedemptionOption {
            id: RedemptionOptionId::new(inner.next_id()),
            shop: shop.to_owned(),
            name: name.to_owned(),
            description: format!("{name} reward"),
            points_cost,
            reward,
            value,
            is_active,
        };
        inner.options.push(option.clone());
        option
    }

    /// Sum of all ledger deltas for a customer. Test helper for the
    /// balance-equals-ledger invariant.
    pub async fn ledger_sum(&self, id: CustomerId) -> i64 {
        let inner = self.inner.lock().await;
        inner
            .transactions
            .iter()
            .filter(|t| t.customer_id == id)
            .map(|t| t.points)
            .sum()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryStore {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_customer_by_external(
        &self,
        shop: &str,
        external_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .customers
            .iter()
            .find(|c| c.shop == shop && c.shopify_customer_id == external_id)
            .cloned())
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let mut inner = self.inner.lock().await;

        if inner
            .customers
            .iter()
            .any(|c| c.shop == new.shop && c.shopify_customer_id == new.shopify_customer_id)
        {
            return Err(StoreError::Conflict("customer already exists".to_owned()));
        }

        let now = Utc::now();
        let customer = Customer {
            id: CustomerId::new(inner.next_id()),
            shopify_customer_id: new.shopify_customer_id,
            shop: new.shop,
            email: new.profile.email,
            first_name: new.profile.first_name,
            last_name: new.profile.last_name,
            total_points: 0,
            total_spent: Decimal::ZERO,
            membership_tier: TierLevel::Bronze,
            created_at: now,
            updated_at: now,
        };
        inner.customers.push(customer.clone());
        Ok(customer)
    }

    async fn set_customer_tier(
        &self,
        id: CustomerId,
        tier: TierLevel,
    ) -> Result<Customer, StoreError> {
        let mut inner = self.inner.lock().await;
        let customer = inner
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        customer.membership_tier = tier;
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    async fn record_purchase(
        &self,
        id: CustomerId,
        tx: NewTransaction,
        amount: Decimal,
    ) -> Result<(PointTransaction, Customer), StoreError> {
        let mut inner = self.inner.lock().await;
        let snapshot = inner
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        let entry = inner.push_transaction(&snapshot, tx);

        let customer = inner
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        customer.total_points += entry.points;
        customer.total_spent += amount;
        customer.updated_at = Utc::now();

        Ok((entry, customer.clone()))
    }

    async fn record_signup_bonus(
        &self,
        id: CustomerId,
        tx: NewTransaction,
    ) -> Result<PointTransaction, StoreError> {
        let mut inner = self.inner.lock().await;
        let snapshot = inner
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        let entry = inner.push_transaction(&snapshot, tx);

        let customer = inner
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        customer.total_points += entry.points;
        customer.updated_at = Utc::now();

        Ok(entry)
    }

    async fn recent_transactions(
        &self,
        id: CustomerId,
        limit: i64,
    ) -> Result<Vec<PointTransaction>, StoreError> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<_> = inner
            .transactions
            .iter()
            .filter(|t| t.customer_id == id)
            .cloned()
            .collect();
        matching.reverse();
        matching.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(matching)
    }

    async fn redeem(
        &self,
        id: CustomerId,
        option: &RedemptionOption,
        tx: NewTransaction,
        expires_at: DateTime<Utc>,
    ) -> Result<Redemption, StoreError> {
        let mut inner = self.inner.lock().await;
        let snapshot = inner
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        // Compare-and-set under the store lock: nothing is mutated unless
        // the balance still covers the cost.
        if snapshot.total_points < option.points_cost {
            return Err(StoreError::Conflict("insufficient points".to_owned()));
        }

        let entry = inner.push_transaction(&snapshot, tx);
        debug_assert_eq!(entry.points, -option.points_cost);

        let customer = inner
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        customer.total_points -= option.points_cost;
        customer.updated_at = Utc::now();

        let redemption = Redemption {
            id: RedemptionId::new(inner.next_id()),
            customer_id: id,
            shop: option.shop.clone(),
            option_id: option.id,
            points_spent: option.points_cost,
            status: RedemptionStatus::Pending,
            created_at: Utc::now(),
            expires_at,
        };
        inner.redemptions.push(redemption.clone());
        Ok(redemption)
    }

    async fn pending_redemptions(
        &self,
        id: CustomerId,
    ) -> Result<Vec<PendingRedemption>, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .redemptions
            .iter()
            .filter(|r| r.customer_id == id && r.status == RedemptionStatus::Pending)
            .map(|r| {
                let option = inner
                    .options
                    .iter()
                    .find(|o| o.id == r.option_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::DataCorruption(format!(
                            "redemption {} references missing option {}",
                            r.id, r.option_id
                        ))
                    })?;
                Ok(PendingRedemption {
                    redemption: r.clone(),
                    option,
                })
            })
            .collect()
    }

    async fn list_tiers(&self, shop: &str) -> Result<Vec<MembershipTier>, StoreError> {
        let inner = self.inner.lock().await;
        let mut tiers: Vec<_> = inner
            .tiers
            .iter()
            .filter(|t| t.shop == shop)
            .cloned()
            .collect();
        tiers.sort_by_key(|t| t.min_spent);
        Ok(tiers)
    }

    async fn find_option(
        &self,
        id: RedemptionOptionId,
    ) -> Result<Option<RedemptionOption>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.options.iter().find(|o| o.id == id).cloned())
    }

    async fn affordable_options(
        &self,
        shop: &str,
        max_cost: i64,
    ) -> Result<Vec<RedemptionOption>, StoreError> {
        let inner = self.inner.lock().await;
        let mut options: Vec<_> = inner
            .options
            .iter()
            .filter(|o| o.shop == shop && o.is_active && o.points_cost <= max_cost)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.points_cost);
        Ok(options)
    }

    async fn shop_config(&self, shop: &str) -> Result<ShopConfig, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .configs
            .entry(shop.to_owned())
            .or_insert_with(|| ShopConfig::defaults(shop))
            .clone())
    }

    async fn shop_stats(&self, shop: &str) -> Result<ShopStats, StoreError> {
        let inner = self.inner.lock().await;
        let total_customers = inner.customers.iter().filter(|c| c.shop == shop).count();
        let total_points_awarded: i64 = inner
            .transactions
            .iter()
            .filter(|t| t.shop == shop && t.points > 0)
            .map(|t| t.points)
            .sum();
        let total_redemptions = inner.redemptions.iter().filter(|r| r.shop == shop).count();

        Ok(ShopStats {
            total_customers: total_customers as i64,
            total_points_awarded,
            total_redemptions: total_redemptions as i64,
        })
    }
}
