//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! nico-rewards-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `REWARDS_DATABASE_URL` - `PostgreSQL` connection string for the rewards database

use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Run the rewards database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration fails to apply.
pub async fn rewards() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("REWARDS_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("REWARDS_DATABASE_URL"))?;

    tracing::info!("Connecting to rewards database...");
    let pool = nico_rewards::store::create_pool(&database_url).await?;

    tracing::info!("Running rewards migrations...");
    sqlx::migrate!("../rewards/migrations").run(&pool).await?;

    tracing::info!("Rewards migrations complete!");
    Ok(())
}
