//! The rewards service: accrual, lifecycle, summary, and redemption
//! workflows over the ledger store.

mod error;

pub use error::RewardsError;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use nico_rewards_core::{CustomerId, RedemptionOptionId, TransactionType};

use crate::models::{
    Customer, CustomerProfile, CustomerSummary, MembershipTier, NewCustomer, NewTransaction,
    PurchaseAccrual, Redemption, ShopConfig, ShopStats,
};
use crate::services::tiers;
use crate::store::{LedgerStore, StoreError};

/// How long a redemption stays redeemable downstream.
const REDEMPTION_VALIDITY_DAYS: i64 = 30;

/// How many ledger entries the customer summary includes.
const SUMMARY_TRANSACTION_LIMIT: i64 = 10;

/// Points earned for a purchase: `floor(amount * rate * 100)`.
///
/// One monetary unit is 100 base points, scaled by the cashback fraction and
/// floored - never rounded up. Saturates at `i64::MAX` for amounts beyond
/// the representable range.
fn points_earned(amount: Decimal, rate: Decimal) -> i64 {
    (amount * rate * Decimal::ONE_HUNDRED)
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Rewards workflows for one shop.
///
/// Every operation is scoped to the shop the service was created for;
/// records belonging to other shops are treated as nonexistent.
pub struct RewardsService<'a> {
    store: &'a dyn LedgerStore,
    shop: &'a str,
}

impl<'a> RewardsService<'a> {
    /// Create a service for one shop over the given store.
    #[must_use]
    pub const fn new(store: &'a dyn LedgerStore, shop: &'a str) -> Self {
        Self { store, shop }
    }

    /// Look up a customer by external ID, creating them on first contact.
    ///
    /// A new customer starts with zero balances on the lowest tier and is
    /// immediately granted the shop's welcome bonus (an `EARNED_SIGNUP`
    /// ledger entry plus the matching balance increment); the returned
    /// record is re-read so it reflects the bonus. Without profile data no
    /// record is fabricated: an unknown external ID returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::Store` if a store operation fails.
    pub async fn get_or_create_customer(
        &self,
        external_id: &str,
        profile: Option<CustomerProfile>,
        config: &ShopConfig,
    ) -> Result<Option<Customer>, RewardsError> {
        if let Some(customer) = self
            .store
            .find_customer_by_external(self.shop, external_id)
            .await?
        {
            return Ok(Some(customer));
        }

        let Some(profile) = profile else {
            return Ok(None);
        };

        let created = match self
            .store
            .create_customer(NewCustomer {
                shopify_customer_id: external_id.to_owned(),
                shop: self.shop.to_owned(),
                profile,
            })
            .await
        {
            Ok(customer) => customer,
            // Lost a creation race: the winner's create already granted the
            // welcome bonus, so just return the existing row.
            Err(StoreError::Conflict(_)) => {
                return self
                    .store
                    .find_customer_by_external(self.shop, external_id)
                    .await
                    .map_err(Into::into);
            }
            Err(e) => return Err(e.into()),
        };

        self.store
            .record_signup_bonus(
                created.id,
                NewTransaction {
                    points: config.welcome_bonus,
                    kind: TransactionType::EarnedSignup,
                    order_id: None,
                    amount: None,
                    description: "Welcome bonus".to_owned(),
                },
            )
            .await?;

        tracing::info!(
            customer = %created.id,
            shop = %self.shop,
            bonus = config.welcome_bonus,
            "created rewards customer with welcome bonus"
        );

        // Re-read so the returned record includes the bonus.
        self.store
            .find_customer(created.id)
            .await?
            .ok_or(RewardsError::CustomerNotFound)
            .map(Some)
    }

    /// Credit cashback points for a paid order.
    ///
    /// The rate comes from the tier the customer holds *before* this
    /// purchase; a purchase that crosses a tier threshold still earns at the
    /// pre-upgrade rate, and the tier check runs afterwards on the
    /// post-purchase spend. Returns `Ok(None)` if the customer ID does not
    /// resolve within this shop.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::InvalidAmount` for a negative amount, or
    /// `RewardsError::Store` if a store operation fails.
    pub async fn add_points_for_purchase(
        &self,
        customer_id: CustomerId,
        order_id: &str,
        amount: Decimal,
    ) -> Result<Option<PurchaseAccrual>, RewardsError> {
        if amount < Decimal::ZERO {
            return Err(RewardsError::InvalidAmount);
        }

        let Some(customer) = self.customer_in_shop(customer_id).await? else {
            return Ok(None);
        };

        let tiers = self.store.list_tiers(self.shop).await?;

        // Rate from the pre-purchase tier; the upgrade check comes after.
        let rate = tiers::cashback_rate_for(&tiers, customer.membership_tier);
        let points = points_earned(amount, rate);

        let (transaction, updated) = self
            .store
            .record_purchase(
                customer.id,
                NewTransaction {
                    points,
                    kind: TransactionType::EarnedPurchase,
                    order_id: Some(order_id.to_owned()),
                    amount: Some(amount),
                    description: format!("Purchase cashback: {:.1}%", rate * Decimal::ONE_HUNDRED),
                },
                amount,
            )
            .await?;

        tracing::info!(
            customer = %customer.id,
            order = order_id,
            points,
            "credited purchase cashback"
        );

        let customer = self.apply_tier_upgrade(updated, &tiers).await?;

        Ok(Some(PurchaseAccrual {
            transaction,
            customer,
            points_earned: points,
        }))
    }

    /// Everything the widget shows for a customer: the record with its 10
    /// most recent ledger entries and pending redemptions, the affordable
    /// active options (cheapest first), and tier progression.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::Store` if a store operation fails.
    pub async fn get_customer_summary(
        &self,
        external_id: &str,
    ) -> Result<Option<CustomerSummary>, RewardsError> {
        let Some(customer) = self
            .store
            .find_customer_by_external(self.shop, external_id)
            .await?
        else {
            return Ok(None);
        };

        let transactions = self
            .store
            .recent_transactions(customer.id, SUMMARY_TRANSACTION_LIMIT)
            .await?;
        let pending_redemptions = self.store.pending_redemptions(customer.id).await?;
        let available_redemptions = self
            .store
            .affordable_options(self.shop, customer.total_points)
            .await?;
        let ladder = self.store.list_tiers(self.shop).await?;
        let tier_progression = tiers::tier_progression(&ladder, &customer);

        Ok(Some(CustomerSummary {
            customer,
            transactions,
            pending_redemptions,
            available_redemptions,
            tier_progression,
        }))
    }

    /// Exchange points for a redemption option.
    ///
    /// Validates before mutating: the customer and option must exist in this
    /// shop, the option must be active, and the balance must cover the cost.
    /// The store then applies the debit, ledger entry, and PENDING
    /// redemption as one atomic unit with a compare-and-set debit, so a
    /// concurrent redemption that drains the balance after validation fails
    /// cleanly instead of over-spending. Tiers react only to spend, so no
    /// tier check happens here.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::CustomerNotFound`, `OptionNotFound`,
    /// `OptionInactive`, or `InsufficientPoints` for business-rule
    /// violations; `RewardsError::Store` for store failures.
    pub async fn redeem_points(
        &self,
        customer_id: CustomerId,
        option_id: RedemptionOptionId,
    ) -> Result<Redemption, RewardsError> {
        let customer = self
            .customer_in_shop(customer_id)
            .await?
            .ok_or(RewardsError::CustomerNotFound)?;

        let option = self
            .store
            .find_option(option_id)
            .await?
            .filter(|o| o.shop == self.shop)
            .ok_or(RewardsError::OptionNotFound)?;

        if !option.is_active {
            return Err(RewardsError::OptionInactive);
        }

        if customer.total_points < option.points_cost {
            return Err(RewardsError::InsufficientPoints {
                have: customer.total_points,
                need: option.points_cost,
            });
        }

        let expires_at = Utc::now() + Duration::days(REDEMPTION_VALIDITY_DAYS);
        let result = self
            .store
            .redeem(
                customer.id,
                &option,
                NewTransaction {
                    points: -option.points_cost,
                    kind: TransactionType::Redeemed,
                    order_id: None,
                    amount: None,
                    description: format!("Redeemed: {}", option.name),
                },
                expires_at,
            )
            .await;

        match result {
            Ok(redemption) => {
                tracing::info!(
                    customer = %customer.id,
                    option = %option.id,
                    points = option.points_cost,
                    "redeemed points"
                );
                Ok(redemption)
            }
            // The compare-and-set lost a race: another redemption drained
            // the balance between validation and commit.
            Err(StoreError::Conflict(_)) => Err(RewardsError::InsufficientPoints {
                have: customer.total_points,
                need: option.points_cost,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The shop's configuration, created with defaults on first access.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::Store` if a store operation fails.
    pub async fn app_config(&self) -> Result<ShopConfig, RewardsError> {
        Ok(self.store.shop_config(self.shop).await?)
    }

    /// Merchant-dashboard aggregates for this shop.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::Store` if a store operation fails.
    pub async fn shop_stats(&self) -> Result<ShopStats, RewardsError> {
        Ok(self.store.shop_stats(self.shop).await?)
    }

    /// Load a customer by internal ID, treating other shops' rows as absent.
    async fn customer_in_shop(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, RewardsError> {
        Ok(self
            .store
            .find_customer(customer_id)
            .await?
            .filter(|c| c.shop == self.shop))
    }

    /// Re-resolve the tier from lifetime spend and persist an upgrade.
    async fn apply_tier_upgrade(
        &self,
        customer: Customer,
        ladder: &[MembershipTier],
    ) -> Result<Customer, RewardsError> {
        let resolved = tiers::resolve_tier(ladder, customer.total_spent);
        if resolved == customer.membership_tier {
            return Ok(customer);
        }

        tracing::info!(
            customer = %customer.id,
            from = %customer.membership_tier,
            to = %resolved,
            "tier change"
        );
        Ok(self.store.set_customer_tier(customer.id, resolved).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_floor_and_never_round_up() {
        // floor(600 * 0.01 * 100) = 600
        assert_eq!(
            points_earned(Decimal::from(600), Decimal::new(1, 2)),
            600
        );
        // floor(19.99 * 0.02 * 100) = floor(39.98) = 39
        assert_eq!(
            points_earned(Decimal::new(1999, 2), Decimal::new(2, 2)),
            39
        );
        // floor(0.33 * 0.03 * 100) = floor(0.99) = 0
        assert_eq!(points_earned(Decimal::new(33, 2), Decimal::new(3, 2)), 0);
        assert_eq!(points_earned(Decimal::ZERO, Decimal::new(3, 2)), 0);
    }
}
