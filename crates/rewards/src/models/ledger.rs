//! Point-ledger domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use nico_rewards_core::{CustomerId, TransactionId, TransactionType};

use super::Customer;

/// An immutable ledger entry.
///
/// Append-only; the sequence of these entries is the sole source of truth
/// for a customer's point history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    pub id: TransactionId,
    pub customer_id: CustomerId,
    pub shop: String,
    /// Signed point delta (negative for redemptions).
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Order reference for purchase accruals.
    pub order_id: Option<String>,
    /// Monetary amount for purchase accruals.
    pub amount: Option<Decimal>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a ledger entry. The store fills in the customer,
/// shop, and timestamp.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub points: i64,
    pub kind: TransactionType,
    pub order_id: Option<String>,
    pub amount: Option<Decimal>,
    pub description: String,
}

/// Result of a purchase accrual.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseAccrual {
    pub transaction: PointTransaction,
    /// Customer after the accrual (and any tier upgrade it triggered).
    pub customer: Customer,
    pub points_earned: i64,
}
