//! Seed the demo tier ladder and redemption options for a shop.
//!
//! Idempotent: tiers upsert on their `(name, shop)` key and options are
//! only inserted when a same-named option does not already exist.
//!
//! # Usage
//!
//! ```bash
//! nico-rewards-cli seed --shop demo.myshopify.com
//! ```
//!
//! # Environment Variables
//!
//! - `REWARDS_DATABASE_URL` - `PostgreSQL` connection string for the rewards database

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::info;

use super::migrate::MigrationError;

/// Demo ladder: name, minimum lifetime spend, cashback rate, display color.
const DEMO_TIERS: &[(&str, i64, (i64, u32), &str)] = &[
    ("Bronze", 0, (1, 2), "#CD7F32"),
    ("Silver", 500, (2, 2), "#C0C0C0"),
    ("Gold", 1000, (3, 2), "#FFD700"),
];

/// Demo catalog: name, description, point cost, reward type, value.
const DEMO_OPTIONS: &[(&str, &str, i64, &str, i64)] = &[
    (
        "5% Off Order",
        "Get 5% off your next order",
        500,
        "PERCENTAGE_DISCOUNT",
        5,
    ),
    (
        "$10 Off Order",
        "Get $10 off your next order",
        1000,
        "FIXED_DISCOUNT",
        10,
    ),
    (
        "Free Shipping",
        "Free shipping on your next order",
        300,
        "FREE_SHIPPING",
        0,
    ),
];

/// Seed the demo configuration for `shop`.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing or a statement
/// fails.
pub async fn demo_data(shop: &str) -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("REWARDS_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("REWARDS_DATABASE_URL"))?;

    let pool = nico_rewards::store::create_pool(&database_url).await?;

    seed_tiers(&pool, shop).await?;
    seed_options(&pool, shop).await?;

    info!(shop, "Seeding completed!");
    Ok(())
}

async fn seed_tiers(pool: &PgPool, shop: &str) -> Result<(), sqlx::Error> {
    for (name, min_spent, (rate_mantissa, rate_scale), color) in DEMO_TIERS {
        sqlx::query(
            "INSERT INTO rewards.membership_tier (name, shop, min_spent, cashback_rate, color) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (name, shop) DO NOTHING",
        )
        .bind(name)
        .bind(shop)
        .bind(Decimal::from(*min_spent))
        .bind(Decimal::new(*rate_mantissa, *rate_scale))
        .bind(color)
        .execute(pool)
        .await?;

        info!(shop, tier = name, "seeded tier");
    }
    Ok(())
}

async fn seed_options(pool: &PgPool, shop: &str) -> Result<(), sqlx::Error> {
    for (name, description, points_cost, reward, value) in DEMO_OPTIONS {
        sqlx::query(
            "INSERT INTO rewards.redemption_option \
             (shop, name, description, points_cost, reward, value) \
             SELECT $1, $2, $3, $4, $5, $6 \
             WHERE NOT EXISTS (\
                 SELECT 1 FROM rewards.redemption_option WHERE shop = $1 AND name = $2\
             )",
        )
        .bind(shop)
        .bind(name)
        .bind(description)
        .bind(points_cost)
        .bind(reward)
        .bind(Decimal::from(*value))
        .execute(pool)
        .await?;

        info!(shop, option = name, "seeded redemption option");
    }
    Ok(())
}
