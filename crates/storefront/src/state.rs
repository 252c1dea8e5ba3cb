//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, HttpShopApi, ShopApi};
use crate::config::StorefrontConfig;
use crate::store::VisitorRegistry;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; gives access to the configuration and the
/// per-visitor stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    visitors: VisitorRegistry,
}

impl AppState {
    /// Create application state around an existing shop API implementation.
    #[must_use]
    pub fn new(config: StorefrontConfig, api: Arc<dyn ShopApi>) -> Self {
        let visitors = VisitorRegistry::new(api, config.visitor_idle);
        Self {
            inner: Arc::new(AppStateInner { config, visitors }),
        }
    }

    /// Create application state talking to the configured shop API over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = HttpShopApi::new(&config.shop_api)?;
        Ok(Self::new(config, Arc::new(api)))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Per-visitor stores and profile views.
    #[must_use]
    pub fn visitors(&self) -> &VisitorRegistry {
        &self.inner.visitors
    }
}
