//! Centralized per-visitor state.
//!
//! # Architecture
//!
//! - [`StoreState`] holds four observable slices: session, user details,
//!   my orders, and profile update
//! - [`Store::dispatch`] runs an [`Action`] through the pure [`reduce`]
//!   function and publishes the new state on a `tokio::sync::watch` channel
//! - [`Store::run`] executes a [`Command`] fire-and-forget: the request action
//!   is dispatched immediately, the API call runs on a spawned task, and its
//!   outcome arrives later as a success or fail action
//!
//! Views never await a command. They observe snapshots and react.

pub mod registry;
pub mod state;

pub use registry::{Visitor, VisitorRegistry};
pub use state::{Action, SessionSlice, Slice, StoreState, UpdateSlice, reduce};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{ApiError, ShopApi, UpdateProfileRequest};

/// Work the store performs on behalf of a view.
#[derive(Debug, Clone)]
pub enum Command {
    /// Forget the outcome of the last profile update.
    ResetUpdateFlag,
    /// Load the signed-in user's profile.
    FetchProfile,
    /// Load the signed-in user's orders.
    FetchOrders,
    /// Send a profile update.
    UpdateProfile(UpdateProfileRequest),
}

/// Centralized state for one visitor.
///
/// Cheaply cloneable; clones share the same state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<StoreState>,
    api: Arc<dyn ShopApi>,
}

impl Store {
    /// Create an empty store backed by `api`.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            inner: Arc::new(StoreInner { state, api }),
        }
    }

    /// An immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.inner.state.borrow().clone()
    }

    /// Apply an action and publish the new state.
    pub fn dispatch(&self, action: Action) {
        debug!(action = action.name(), "dispatch");
        self.inner.state.send_modify(|state| {
            let next = reduce(state, action);
            *state = next;
        });
    }

    /// Execute a command without waiting for it to finish.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self, command: Command) {
        match command {
            Command::ResetUpdateFlag => self.dispatch(Action::UpdateReset),
            Command::FetchProfile => {
                self.dispatch(Action::DetailsRequest);
                let store = self.clone();
                tokio::spawn(async move { store.fetch_profile().await });
            }
            Command::FetchOrders => {
                self.dispatch(Action::OrdersRequest);
                let store = self.clone();
                tokio::spawn(async move { store.fetch_orders().await });
            }
            Command::UpdateProfile(request) => {
                self.dispatch(Action::UpdateRequest);
                let store = self.clone();
                tokio::spawn(async move { store.update_profile(request).await });
            }
        }
    }

    fn token(&self) -> Result<String, ApiError> {
        self.inner
            .state
            .borrow()
            .token()
            .map(ToOwned::to_owned)
            .ok_or(ApiError::NoToken)
    }

    async fn fetch_profile(&self) {
        let result = match self.token() {
            Ok(token) => self.inner.api.get_profile(&token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(profile) => self.dispatch(Action::DetailsSuccess(profile)),
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile");
                self.dispatch(Action::DetailsFail(e.user_message()));
            }
        }
    }

    async fn fetch_orders(&self) {
        let result = match self.token() {
            Ok(token) => self.inner.api.list_own_orders(&token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(orders) => self.dispatch(Action::OrdersSuccess(orders)),
            Err(e) => {
                warn!(error = %e, "Failed to fetch orders");
                self.dispatch(Action::OrdersFail(e.user_message()));
            }
        }
    }

    async fn update_profile(&self, request: UpdateProfileRequest) {
        let result = match self.token() {
            Ok(token) => self.inner.api.update_profile(&token, &request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(user_info) => self.dispatch(Action::UpdateSuccess(user_info)),
            Err(e) => {
                warn!(error = %e, user_id = %request.id, "Failed to update profile");
                self.dispatch(Action::UpdateFail(e.user_message()));
            }
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use kgp_shop_core::UserId;

    use super::testing::{FakeShopApi, profile, user_info};
    use super::*;

    /// Wait until `done` holds for the store state, or give up after a second.
    async fn wait_for(store: &Store, done: impl Fn(&StoreState) -> bool) -> StoreState {
        let mut rx = store.inner.state.subscribe();
        let reached = tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| done(s)))
            .await
            .is_ok_and(|r| r.is_ok());
        assert!(reached, "store did not reach expected state");
        store.snapshot()
    }

    #[tokio::test]
    async fn test_fetch_profile_dispatches_request_then_success() {
        let store = Store::new(Arc::new(FakeShopApi::default()));
        store.dispatch(Action::SessionChanged(Some(user_info())));

        store.run(Command::FetchProfile);
        assert!(store.snapshot().user_details.loading);

        let state = wait_for(&store, |s| !s.user_details.loading).await;
        assert_eq!(state.user_details.data, Some(profile()));
    }

    #[tokio::test]
    async fn test_fetch_without_session_fails_with_no_token() {
        let store = Store::new(Arc::new(FakeShopApi::default()));

        store.run(Command::FetchOrders);
        let state = wait_for(&store, |s| !s.my_orders.loading).await;
        assert_eq!(
            state.my_orders.error.as_deref(),
            Some("Not authorized, no token")
        );
    }

    #[tokio::test]
    async fn test_fetch_profile_failure_is_recorded_as_text() {
        let api = FakeShopApi {
            fail_profile: true,
            ..FakeShopApi::default()
        };
        let store = Store::new(Arc::new(api));
        store.dispatch(Action::SessionChanged(Some(user_info())));

        store.run(Command::FetchProfile);
        let state = wait_for(&store, |s| !s.user_details.loading).await;
        assert_eq!(state.user_details.error.as_deref(), Some("Network Error"));
        assert_eq!(state.user_details.data, None);
    }

    #[tokio::test]
    async fn test_update_profile_uses_session_token_and_refreshes_it() {
        let api = Arc::new(FakeShopApi::default());
        let store = Store::new(api.clone());
        store.dispatch(Action::SessionChanged(Some(user_info())));

        store.run(Command::UpdateProfile(UpdateProfileRequest {
            id: UserId::new("u1"),
            name: "Asha K".to_string(),
            email: "asha@kgp.in".to_string(),
            password: SecretString::from("new-pass"),
        }));

        let state = wait_for(&store, |s| s.profile_update.success).await;
        assert_eq!(state.token(), Some("token-2"));

        let updates = api.updates.lock().unwrap();
        assert_eq!(
            updates.as_slice(),
            &[(
                "token-1".to_string(),
                "Asha K".to_string(),
                "new-pass".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_reset_update_flag_is_synchronous() {
        let store = Store::new(Arc::new(FakeShopApi::default()));
        store.dispatch(Action::UpdateSuccess(user_info()));
        store.run(Command::ResetUpdateFlag);
        assert!(!store.snapshot().profile_update.success);
    }
}
