//! End-to-end rewards workflow tests over the in-memory ledger store.
//!
//! Covers the accrual math, tier upgrades, welcome-bonus semantics, the
//! redemption preconditions, and the balance-equals-ledger invariant after
//! mixed operation sequences.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use nico_rewards::models::{CustomerProfile, ShopConfig};
use nico_rewards::services::{RewardsError, RewardsService};
use nico_rewards::store::{LedgerStore, MemoryStore};
use nico_rewards_core::{CustomerId, RewardType, TierLevel, TransactionType};

const SHOP: &str = "demo.myshopify.com";
const OTHER_SHOP: &str = "other.myshopify.com";

/// Store seeded with the demo ladder (Bronze 0/1%, Silver 500/2%,
/// Gold 1000/3%) and a few redemption options.
async fn demo_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .seed_tier(SHOP, "Bronze", Decimal::ZERO, Decimal::new(1, 2), "#CD7F32")
        .await;
    store
        .seed_tier(SHOP, "Silver", Decimal::from(500), Decimal::new(2, 2), "#C0C0C0")
        .await;
    store
        .seed_tier(SHOP, "Gold", Decimal::from(1000), Decimal::new(3, 2), "#FFD700")
        .await;
    store
}

fn profile() -> CustomerProfile {
    CustomerProfile {
        email: Some("shopper@example.com".parse().unwrap()),
        first_name: Some("Sam".to_owned()),
        last_name: Some("Doe".to_owned()),
    }
}

async fn shop_config(store: &MemoryStore) -> ShopConfig {
    store.shop_config(SHOP).await.unwrap()
}

/// Create a customer and bring their balance to exactly `points` via the
/// welcome bonus (100) plus one Bronze-rate purchase.
async fn customer_with_points(store: &MemoryStore, external_id: &str, points: i64) -> CustomerId {
    assert!(points >= 100, "helper assumes at least the welcome bonus");
    let config = shop_config(store).await;
    let service = RewardsService::new(store, SHOP);
    let customer = service
        .get_or_create_customer(external_id, Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();

    // Bronze earns floor(amount * 0.01 * 100) = amount points per unit.
    let remaining = points - customer.total_points;
    if remaining > 0 {
        service
            .add_points_for_purchase(customer.id, "order-setup", Decimal::from(remaining))
            .await
            .unwrap()
            .unwrap();
    }
    customer.id
}

#[tokio::test]
async fn welcome_bonus_is_granted_exactly_once() {
    let store = demo_store().await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("1001", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();

    // The returned record already reflects the bonus, and the ledger entry
    // backing it exists with a matching delta.
    assert_eq!(customer.total_points, config.welcome_bonus);
    assert_eq!(customer.membership_tier, TierLevel::Bronze);
    let transactions = store.recent_transactions(customer.id, 10).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionType::EarnedSignup);
    assert_eq!(transactions[0].points, config.welcome_bonus);
    assert_eq!(store.ledger_sum(customer.id).await, customer.total_points);

    // Second contact with the same external ID resolves the existing row;
    // no second EARNED_SIGNUP appears.
    let again = service
        .get_or_create_customer("1001", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.id, customer.id);
    assert_eq!(again.total_points, config.welcome_bonus);
    let transactions = store.recent_transactions(customer.id, 10).await.unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn first_contact_without_profile_is_not_found() {
    let store = demo_store().await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("absent", None, &config)
        .await
        .unwrap();
    assert!(customer.is_none());
}

#[tokio::test]
async fn purchase_earns_at_pre_upgrade_rate_then_upgrades_tier() {
    let store = demo_store().await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("1002", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();

    // A 600 purchase crosses the Silver threshold (500) but earns at the
    // Bronze 1% rate: floor(600 * 0.01 * 100) = 600.
    let accrual = service
        .add_points_for_purchase(customer.id, "order-600", Decimal::from(600))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(accrual.points_earned, 600);
    assert_eq!(accrual.transaction.points, 600);
    assert_eq!(accrual.transaction.kind, TransactionType::EarnedPurchase);
    assert_eq!(accrual.transaction.order_id.as_deref(), Some("order-600"));
    assert!(accrual.transaction.description.contains("1.0%"));
    assert_eq!(accrual.customer.total_spent, Decimal::from(600));
    assert_eq!(accrual.customer.membership_tier, TierLevel::Silver);
    assert_eq!(
        accrual.customer.total_points,
        config.welcome_bonus + 600
    );
    assert_eq!(
        store.ledger_sum(customer.id).await,
        accrual.customer.total_points
    );
}

#[tokio::test]
async fn silver_customer_earns_at_two_percent() {
    let store = demo_store().await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("1003", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();
    service
        .add_points_for_purchase(customer.id, "order-1", Decimal::from(600))
        .await
        .unwrap()
        .unwrap();

    // Now Silver: floor(100 * 0.02 * 100) = 200.
    let accrual = service
        .add_points_for_purchase(customer.id, "order-2", Decimal::from(100))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accrual.points_earned, 200);
    assert!(accrual.transaction.description.contains("2.0%"));
}

#[tokio::test]
async fn accrual_appends_exactly_one_ledger_entry() {
    let store = demo_store().await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("1004", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();
    let before = store.recent_transactions(customer.id, 100).await.unwrap().len();

    service
        .add_points_for_purchase(customer.id, "order-1", Decimal::from(50))
        .await
        .unwrap()
        .unwrap();

    let after = store.recent_transactions(customer.id, 100).await.unwrap();
    assert_eq!(after.len(), before + 1);
}

#[tokio::test]
async fn unknown_customer_accrual_resolves_to_none() {
    let store = demo_store().await;
    let service = RewardsService::new(&store, SHOP);

    let accrual = service
        .add_points_for_purchase(CustomerId::new(999), "order", Decimal::from(10))
        .await
        .unwrap();
    assert!(accrual.is_none());
}

#[tokio::test]
async fn negative_purchase_amount_is_rejected() {
    let store = demo_store().await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("1005", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();

    let result = service
        .add_points_for_purchase(customer.id, "order", Decimal::from(-5))
        .await;
    assert!(matches!(result, Err(RewardsError::InvalidAmount)));
}

#[tokio::test]
async fn redeeming_exact_balance_drains_it_to_zero() {
    let store = demo_store().await;
    let option = store
        .seed_option(SHOP, "5% Off Order", 500, RewardType::PercentageDiscount, Decimal::from(5), true)
        .await;
    let customer_id = customer_with_points(&store, "2001", 500).await;

    let service = RewardsService::new(&store, SHOP);
    let redemption = service.redeem_points(customer_id, option.id).await.unwrap();

    assert_eq!(redemption.points_spent, 500);
    assert_eq!(redemption.option_id, option.id);
    assert!(redemption.expires_at > redemption.created_at);

    let customer = store.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.total_points, 0);
    assert_eq!(store.ledger_sum(customer_id).await, 0);

    let transactions = store.recent_transactions(customer_id, 10).await.unwrap();
    assert_eq!(transactions[0].kind, TransactionType::Redeemed);
    assert_eq!(transactions[0].points, -500);

    let pending = store.pending_redemptions(customer_id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].option.name, "5% Off Order");
}

#[tokio::test]
async fn insufficient_balance_fails_without_mutation() {
    let store = demo_store().await;
    let option = store
        .seed_option(SHOP, "5% Off Order", 500, RewardType::PercentageDiscount, Decimal::from(5), true)
        .await;
    let customer_id = customer_with_points(&store, "2002", 499).await;

    let service = RewardsService::new(&store, SHOP);
    let result = service.redeem_points(customer_id, option.id).await;

    assert!(matches!(
        result,
        Err(RewardsError::InsufficientPoints { have: 499, need: 500 })
    ));

    let customer = store.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.total_points, 499);
    assert_eq!(store.ledger_sum(customer_id).await, 499);
    assert!(store.pending_redemptions(customer_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn inactive_option_is_rejected() {
    let store = demo_store().await;
    let option = store
        .seed_option(SHOP, "Retired", 100, RewardType::FreeShipping, Decimal::ZERO, false)
        .await;
    let customer_id = customer_with_points(&store, "2003", 500).await;

    let service = RewardsService::new(&store, SHOP);
    let result = service.redeem_points(customer_id, option.id).await;
    assert!(matches!(result, Err(RewardsError::OptionInactive)));
}

#[tokio::test]
async fn operations_never_cross_shop_boundaries() {
    let store = demo_store().await;
    let option = store
        .seed_option(SHOP, "5% Off Order", 100, RewardType::PercentageDiscount, Decimal::from(5), true)
        .await;
    let customer_id = customer_with_points(&store, "3001", 500).await;

    let foreign = RewardsService::new(&store, OTHER_SHOP);

    // The other shop's service treats the customer as nonexistent.
    let accrual = foreign
        .add_points_for_purchase(customer_id, "order", Decimal::from(10))
        .await
        .unwrap();
    assert!(accrual.is_none());

    let result = foreign.redeem_points(customer_id, option.id).await;
    assert!(matches!(result, Err(RewardsError::CustomerNotFound)));

    let summary = foreign.get_customer_summary("3001").await.unwrap();
    assert!(summary.is_none());
}

#[tokio::test]
async fn concurrent_redemptions_spend_a_balance_at_most_once() {
    let store = Arc::new(demo_store().await);
    let option = store
        .seed_option(SHOP, "5% Off Order", 500, RewardType::PercentageDiscount, Decimal::from(5), true)
        .await;
    let customer_id = customer_with_points(&store, "4001", 500).await;

    // Two concurrent requests against a balance sufficient for exactly one.
    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = Arc::clone(&store);
        let option_id = option.id;
        handles.push(tokio::spawn(async move {
            let service = RewardsService::new(store.as_ref(), SHOP);
            service.redeem_points(customer_id, option_id).await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(RewardsError::InsufficientPoints { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);

    let customer = store.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.total_points, 0);
    assert_eq!(store.ledger_sum(customer_id).await, 0);
    assert_eq!(store.pending_redemptions(customer_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn summary_assembles_affordable_options_and_progression() {
    let store = demo_store().await;
    store
        .seed_option(SHOP, "Free Shipping", 300, RewardType::FreeShipping, Decimal::ZERO, true)
        .await;
    store
        .seed_option(SHOP, "5% Off Order", 500, RewardType::PercentageDiscount, Decimal::from(5), true)
        .await;
    store
        .seed_option(SHOP, "$10 Off Order", 1000, RewardType::FixedDiscount, Decimal::from(10), true)
        .await;
    store
        .seed_option(SHOP, "Hidden", 100, RewardType::FreeShipping, Decimal::ZERO, false)
        .await;

    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);
    let customer = service
        .get_or_create_customer("5001", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();
    service
        .add_points_for_purchase(customer.id, "order-600", Decimal::from(600))
        .await
        .unwrap()
        .unwrap();

    // Balance 700: the 300 and 500 options are affordable, cheapest first;
    // the inactive option never surfaces.
    let summary = service.get_customer_summary("5001").await.unwrap().unwrap();
    let names: Vec<_> = summary
        .available_redemptions
        .iter()
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(names, ["Free Shipping", "5% Off Order"]);

    // Spend 600 on the Silver rung (500-1000): 20% of the way to Gold.
    let progression = &summary.tier_progression;
    assert_eq!(
        progression.current.as_ref().map(|t| t.name.as_str()),
        Some("Silver")
    );
    assert_eq!(
        progression.next.as_ref().map(|t| t.name.as_str()),
        Some("Gold")
    );
    assert!((progression.progress_to_next - 20.0).abs() < 1e-9);

    assert_eq!(summary.transactions.len(), 2);
    assert!(summary.pending_redemptions.is_empty());
}

#[tokio::test]
async fn summary_for_unknown_customer_is_none() {
    let store = demo_store().await;
    let service = RewardsService::new(&store, SHOP);
    assert!(service.get_customer_summary("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn balance_always_equals_ledger_sum_after_mixed_operations() {
    let store = demo_store().await;
    let option = store
        .seed_option(SHOP, "Free Shipping", 300, RewardType::FreeShipping, Decimal::ZERO, true)
        .await;
    let config = shop_config(&store).await;
    let service = RewardsService::new(&store, SHOP);

    let customer = service
        .get_or_create_customer("6001", Some(profile()), &config)
        .await
        .unwrap()
        .unwrap();

    for (order, amount) in [("o-1", 120), ("o-2", 75), ("o-3", 640), ("o-4", 33)] {
        service
            .add_points_for_purchase(customer.id, order, Decimal::from(amount))
            .await
            .unwrap()
            .unwrap();

        let current = store.find_customer(customer.id).await.unwrap().unwrap();
        assert_eq!(current.total_points, store.ledger_sum(customer.id).await);

        if current.total_points >= option.points_cost {
            service.redeem_points(customer.id, option.id).await.unwrap();
            let current = store.find_customer(customer.id).await.unwrap().unwrap();
            assert_eq!(current.total_points, store.ledger_sum(customer.id).await);
            assert!(current.total_points >= 0);
        }
    }
}

#[tokio::test]
async fn shop_stats_aggregate_the_program() {
    let store = demo_store().await;
    let option = store
        .seed_option(SHOP, "Free Shipping", 300, RewardType::FreeShipping, Decimal::ZERO, true)
        .await;
    let customer_id = customer_with_points(&store, "7001", 500).await;

    let service = RewardsService::new(&store, SHOP);
    service.redeem_points(customer_id, option.id).await.unwrap();

    let stats = service.shop_stats().await.unwrap();
    assert_eq!(stats.total_customers, 1);
    // Welcome bonus (100) + purchase (400); the -300 redemption is excluded.
    assert_eq!(stats.total_points_awarded, 500);
    assert_eq!(stats.total_redemptions, 1);
}
