//! Per-visitor store and view instances.
//!
//! Each browser session gets its own [`Store`] and [`ProfileView`], kept in a
//! `moka` cache that drops visitors after a period of inactivity.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;

use super::Store;
use crate::api::ShopApi;
use crate::profile::ProfileView;

/// Upper bound on concurrently tracked visitors.
const MAX_VISITORS: u64 = 10_000;

/// One visitor's store and profile screen.
pub struct Visitor {
    pub store: Store,
    /// Input events and evaluations are applied one at a time.
    pub profile: Mutex<ProfileView>,
}

impl Visitor {
    fn new(api: Arc<dyn ShopApi>) -> Self {
        Self {
            store: Store::new(api),
            profile: Mutex::new(ProfileView::default()),
        }
    }
}

/// Registry of live visitors, keyed by an opaque visitor id.
#[derive(Clone)]
pub struct VisitorRegistry {
    visitors: Cache<String, Arc<Visitor>>,
    api: Arc<dyn ShopApi>,
}

impl VisitorRegistry {
    /// Create a registry whose visitors expire after `idle` without use.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>, idle: Duration) -> Self {
        let visitors = Cache::builder()
            .max_capacity(MAX_VISITORS)
            .time_to_idle(idle)
            .build();

        Self { visitors, api }
    }

    /// Get the visitor for `key`, creating a fresh one if needed.
    pub async fn get_or_create(&self, key: &str) -> Arc<Visitor> {
        let api = Arc::clone(&self.api);
        self.visitors
            .get_with(key.to_owned(), async move { Arc::new(Visitor::new(api)) })
            .await
    }

    /// Forget a visitor (logout).
    pub async fn remove(&self, key: &str) {
        self.visitors.invalidate(key).await;
    }

    /// The shop API visitors' stores talk to.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn ShopApi> {
        &self.api
    }
}
