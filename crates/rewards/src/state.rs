//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::models::ShopConfig;
use crate::store::LedgerStore;

/// How long a cached per-shop configuration stays fresh.
const SHOP_CONFIG_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides the ledger store, the service
/// configuration, and a per-shop cache of `ShopConfig` so workflows receive
/// their tunables as an explicit argument instead of re-reading the store
/// on every request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    store: Arc<dyn LedgerStore>,
    shop_configs: Cache<String, ShopConfig>,
}

impl AppState {
    /// Create a new application state over a ledger store.
    #[must_use]
    pub fn new(config: ServiceConfig, store: Arc<dyn LedgerStore>) -> Self {
        let shop_configs = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(SHOP_CONFIG_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                shop_configs,
            }),
        }
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// The ledger store.
    #[must_use]
    pub fn store(&self) -> &dyn LedgerStore {
        self.inner.store.as_ref()
    }

    /// The shop's configuration, from the per-shop cache or the store
    /// (created with defaults on first access).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the store lookup fails.
    pub async fn shop_config(&self, shop: &str) -> Result<ShopConfig, AppError> {
        if let Some(config) = self.inner.shop_configs.get(shop).await {
            return Ok(config);
        }

        let config = self.inner.store.shop_config(shop).await?;
        self.inner
            .shop_configs
            .insert(shop.to_owned(), config.clone())
            .await;
        Ok(config)
    }
}
