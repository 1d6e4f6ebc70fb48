//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::products::CatalogFacets;
use crate::services::stripe::StripeClient;

/// Facet cache time-to-live.
const FACET_CACHE_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    stripe: Option<StripeClient>,
    facets: Cache<&'static str, CatalogFacets>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let stripe = config.stripe.as_ref().map(StripeClient::new);
        let facets = Cache::builder()
            .max_capacity(1)
            .time_to_live(FACET_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stripe,
                facets,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The Stripe client, present in stripe checkout mode.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }

    /// Cache of catalog facets.
    #[must_use]
    pub fn facet_cache(&self) -> &Cache<&'static str, CatalogFacets> {
        &self.inner.facets
    }
}
