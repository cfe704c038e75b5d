//! `PostgreSQL` implementation of the ledger store.
//!
//! Rows are fetched into plain `FromRow` structs and converted into domain
//! types; a stored value that no longer parses (tier level, transaction
//! type, email) surfaces as `StoreError::DataCorruption` rather than a
//! panic. Multi-statement units run inside a database transaction, and the
//! redemption debit is a conditional `UPDATE` checked via `rows_affected`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use nico_rewards_core::{
    CustomerId, Email, RedemptionId, RedemptionOptionId, TierId, TierLevel, TransactionId,
};

use super::{LedgerStore, StoreError};
use crate::models::{
    Customer, MembershipTier, NewCustomer, NewTransaction, PendingRedemption, PointTransaction,
    Redemption, RedemptionOption, ShopConfig, ShopStats,
};

/// Ledger store backed by the `rewards` schema in `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CUSTOMER_COLUMNS: &str = "id, shopify_customer_id, shop, email, first_name, last_name, \
     total_points, total_spent, membership_tier, created_at, updated_at";

const TRANSACTION_COLUMNS: &str =
    "id, customer_id, shop, points, kind, order_id, amount, description, created_at";

const OPTION_COLUMNS: &str =
    "id, shop, name, description, points_cost, reward, value, is_active";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    shopify_customer_id: String,
    shop: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    total_points: i64,
    total_spent: Decimal,
    membership_tier: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(row: CustomerRow) -> Result<Self, StoreError> {
        let membership_tier = row.membership_tier.parse::<TierLevel>().map_err(|e| {
            StoreError::DataCorruption(format!("invalid tier in database: {e}"))
        })?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;

        Ok(Self {
            id: CustomerId::new(row.id),
            shopify_customer_id: row.shopify_customer_id,
            shop: row.shop,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            total_points: row.total_points,
            total_spent: row.total_spent,
            membership_tier,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i32,
    customer_id: i32,
    shop: String,
    points: i64,
    kind: String,
    order_id: Option<String>,
    amount: Option<Decimal>,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for PointTransaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, StoreError> {
        let kind = row.kind.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid transaction type in database: {e}"))
        })?;

        Ok(Self {
            id: TransactionId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            shop: row.shop,
            points: row.points,
            kind,
            order_id: row.order_id,
            amount: row.amount,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TierRow {
    id: i32,
    name: String,
    shop: String,
    min_spent: Decimal,
    cashback_rate: Decimal,
    color: String,
}

impl From<TierRow> for MembershipTier {
    fn from(row: TierRow) -> Self {
        Self {
            id: TierId::new(row.id),
            name: row.name,
            shop: row.shop,
            min_spent: row.min_spent,
            cashback_rate: row.cashback_rate,
            color: row.color,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    id: i32,
    shop: String,
    name: String,
    description: String,
    points_cost: i64,
    reward: String,
    value: Decimal,
    is_active: bool,
}

impl TryFrom<OptionRow> for RedemptionOption {
    type Error = StoreError;

    fn try_from(row: OptionRow) -> Result<Self, StoreError> {
        let reward = row.reward.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid reward type in database: {e}"))
        })?;

        Ok(Self {
            id: RedemptionOptionId::new(row.id),
            shop: row.shop,
            name: row.name,
            description: row.description,
            points_cost: row.points_cost,
            reward,
            value: row.value,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RedemptionRow {
    id: i32,
    customer_id: i32,
    shop: String,
    option_id: i32,
    points_spent: i64,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<RedemptionRow> for Redemption {
    type Error = StoreError;

    fn try_from(row: RedemptionRow) -> Result<Self, StoreError> {
        let status = row.status.parse().map_err(|e| {
            StoreError::DataCorruption(format!("invalid redemption status in database: {e}"))
        })?;

        Ok(Self {
            id: RedemptionId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            shop: row.shop,
            option_id: RedemptionOptionId::new(row.option_id),
            points_spent: row.points_spent,
            status,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresStore {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM rewards.customer WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_customer_by_external(
        &self,
        shop: &str,
        external_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM rewards.customer \
             WHERE shopify_customer_id = $1 AND shop = $2"
        ))
        .bind(external_id)
        .bind(shop)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO rewards.customer \
             (shopify_customer_id, shop, email, first_name, last_name, membership_tier) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&new.shopify_customer_id)
        .bind(&new.shop)
        .bind(new.profile.email.as_ref().map(Email::as_str))
        .bind(&new.profile.first_name)
        .bind(&new.profile.last_name)
        .bind(TierLevel::Bronze.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("customer already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        Customer::try_from(row)
    }

    async fn set_customer_tier(
        &self,
        id: CustomerId,
        tier: TierLevel,
    ) -> Result<Customer, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE rewards.customer \
             SET membership_tier = $1, updated_at = now() \
             WHERE id = $2 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(tier.as_str())
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Customer::try_from(row)
    }

    async fn record_purchase(
        &self,
        id: CustomerId,
        tx: NewTransaction,
        amount: Decimal,
    ) -> Result<(PointTransaction, Customer), StoreError> {
        let mut db_tx = self.pool.begin().await?;

        let transaction = sqlx::query_as::<_, TransactionRow>(&format!(
            "INSERT INTO rewards.point_transaction \
             (customer_id, shop, points, kind, order_id, amount, description) \
             SELECT id, shop, $2, $3, $4, $5, $6 FROM rewards.customer WHERE id = $1 \
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(tx.points)
        .bind(tx.kind.as_str())
        .bind(&tx.order_id)
        .bind(tx.amount)
        .bind(&tx.description)
        .fetch_optional(&mut *db_tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let customer = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE rewards.customer \
             SET total_points = total_points + $1, \
                 total_spent = total_spent + $2, \
                 updated_at = now() \
             WHERE id = $3 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(tx.points)
        .bind(amount)
        .bind(id.as_i32())
        .fetch_one(&mut *db_tx)
        .await?;

        db_tx.commit().await?;

        Ok((transaction.try_into()?, customer.try_into()?))
    }

    async fn record_signup_bonus(
        &self,
        id: CustomerId,
        tx: NewTransaction,
    ) -> Result<PointTransaction, StoreError> {
        let mut db_tx = self.pool.begin().await?;

        let transaction = sqlx::query_as::<_, TransactionRow>(&format!(
            "INSERT INTO rewards.point_transaction \
             (customer_id, shop, points, kind, description) \
             SELECT id, shop, $2, $3, $4 FROM rewards.customer WHERE id = $1 \
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(tx.points)
        .bind(tx.kind.as_str())
        .bind(&tx.description)
        .fetch_optional(&mut *db_tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        sqlx::query(
            "UPDATE rewards.customer \
             SET total_points = total_points + $1, updated_at = now() \
             WHERE id = $2",
        )
        .bind(tx.points)
        .bind(id.as_i32())
        .execute(&mut *db_tx)
        .await?;

        db_tx.commit().await?;

        transaction.try_into()
    }

    async fn recent_transactions(
        &self,
        id: CustomerId,
        limit: i64,
    ) -> Result<Vec<PointTransaction>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM rewards.point_transaction \
             WHERE customer_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        ))
        .bind(id.as_i32())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn redeem(
        &self,
        id: CustomerId,
        option: &RedemptionOption,
        tx: NewTransaction,
        expires_at: DateTime<Utc>,
    ) -> Result<Redemption, StoreError> {
        let mut db_tx = self.pool.begin().await?;

        // Compare-and-set debit: the row is only updated while the stored
        // balance still covers the cost. Zero rows affected means a
        // concurrent redemption won the race after our precondition check.
        let debited = sqlx::query(
            "UPDATE rewards.customer \
             SET total_points = total_points - $1, updated_at = now() \
             WHERE id = $2 AND total_points >= $1",
        )
        .bind(option.points_cost)
        .bind(id.as_i32())
        .execute(&mut *db_tx)
        .await?;

        if debited.rows_affected() == 0 {
            return Err(StoreError::Conflict("insufficient points".to_owned()));
        }

        sqlx::query(
            "INSERT INTO rewards.point_transaction \
             (customer_id, shop, points, kind, description) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id.as_i32())
        .bind(&option.shop)
        .bind(tx.points)
        .bind(tx.kind.as_str())
        .bind(&tx.description)
        .execute(&mut *db_tx)
        .await?;

        let redemption = sqlx::query_as::<_, RedemptionRow>(
            "INSERT INTO rewards.redemption \
             (customer_id, shop, option_id, points_spent, status, expires_at) \
             VALUES ($1, $2, $3, $4, 'PENDING', $5) \
             RETURNING id, customer_id, shop, option_id, points_spent, status, \
                       created_at, expires_at",
        )
        .bind(id.as_i32())
        .bind(&option.shop)
        .bind(option.id.as_i32())
        .bind(option.points_cost)
        .bind(expires_at)
        .fetch_one(&mut *db_tx)
        .await?;

        db_tx.commit().await?;

        redemption.try_into()
    }

    async fn pending_redemptions(
        &self,
        id: CustomerId,
    ) -> Result<Vec<PendingRedemption>, StoreError> {
        #[derive(sqlx::FromRow)]
        struct PendingRow {
            #[sqlx(flatten)]
            redemption: RedemptionRow,
            #[sqlx(flatten)]
            option: JoinedOptionRow,
        }

        #[derive(sqlx::FromRow)]
        struct JoinedOptionRow {
            #[sqlx(rename = "o_id")]
            id: i32,
            #[sqlx(rename = "o_shop")]
            shop: String,
            #[sqlx(rename = "o_name")]
            name: String,
            #[sqlx(rename = "o_description")]
            description: String,
            #[sqlx(rename = "o_points_cost")]
            points_cost: i64,
            #[sqlx(rename = "o_reward")]
            reward: String,
            #[sqlx(rename = "o_value")]
            value: Decimal,
            #[sqlx(rename = "o_is_active")]
            is_active: bool,
        }

        let rows = sqlx::query_as::<_, PendingRow>(
            "SELECT r.id, r.customer_id, r.shop, r.option_id, r.points_spent, r.status, \
                    r.created_at, r.expires_at, \
                    o.id AS o_id, o.shop AS o_shop, o.name AS o_name, \
                    o.description AS o_description, o.points_cost AS o_points_cost, \
                    o.reward AS o_reward, o.value AS o_value, o.is_active AS o_is_active \
             FROM rewards.redemption r \
             JOIN rewards.redemption_option o ON o.id = r.option_id \
             WHERE r.customer_id = $1 AND r.status = 'PENDING' \
             ORDER BY r.created_at DESC",
        )
        .bind(id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let option = OptionRow {
                    id: row.option.id,
                    shop: row.option.shop,
                    name: row.option.name,
                    description: row.option.description,
                    points_cost: row.option.points_cost,
                    reward: row.option.reward,
                    value: row.option.value,
                    is_active: row.option.is_active,
                };
                Ok(PendingRedemption {
                    redemption: row.redemption.try_into()?,
                    option: option.try_into()?,
                })
            })
            .collect()
    }

    async fn list_tiers(&self, shop: &str) -> Result<Vec<MembershipTier>, StoreError> {
        let rows = sqlx::query_as::<_, TierRow>(
            "SELECT id, name, shop, min_spent, cashback_rate, color \
             FROM rewards.membership_tier \
             WHERE shop = $1 \
             ORDER BY min_spent ASC",
        )
        .bind(shop)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_option(
        &self,
        id: RedemptionOptionId,
    ) -> Result<Option<RedemptionOption>, StoreError> {
        let row = sqlx::query_as::<_, OptionRow>(&format!(
            "SELECT {OPTION_COLUMNS} FROM rewards.redemption_option WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RedemptionOption::try_from).transpose()
    }

    async fn affordable_options(
        &self,
        shop: &str,
        max_cost: i64,
    ) -> Result<Vec<RedemptionOption>, StoreError> {
        let rows = sqlx::query_as::<_, OptionRow>(&format!(
            "SELECT {OPTION_COLUMNS} FROM rewards.redemption_option \
             WHERE shop = $1 AND is_active AND points_cost <= $2 \
             ORDER BY points_cost ASC"
        ))
        .bind(shop)
        .bind(max_cost)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn shop_config(&self, shop: &str) -> Result<ShopConfig, StoreError> {
        sqlx::query("INSERT INTO rewards.shop_config (shop) VALUES ($1) ON CONFLICT (shop) DO NOTHING")
            .bind(shop)
            .execute(&self.pool)
            .await?;

        let welcome_bonus: i64 =
            sqlx::query_scalar("SELECT welcome_bonus FROM rewards.shop_config WHERE shop = $1")
                .bind(shop)
                .fetch_one(&self.pool)
                .await?;

        Ok(ShopConfig {
            shop: shop.to_owned(),
            welcome_bonus,
        })
    }

    async fn shop_stats(&self, shop: &str) -> Result<ShopStats, StoreError> {
        let total_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rewards.customer WHERE shop = $1")
                .bind(shop)
                .fetch_one(&self.pool)
                .await?;

        let total_points_awarded: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM rewards.point_transaction \
             WHERE shop = $1 AND points > 0",
        )
        .bind(shop)
        .fetch_one(&self.pool)
        .await?;

        let total_redemptions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rewards.redemption WHERE shop = $1")
                .bind(shop)
                .fetch_one(&self.pool)
                .await?;

        Ok(ShopStats {
            total_customers,
            total_points_awarded,
            total_redemptions,
        })
    }
}
