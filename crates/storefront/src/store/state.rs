//! Store state, actions, and the reducer.
//!
//! Every slice has the same observable shape: a `loading` flag, an optional
//! error message, and the data itself. The reducer is pure; [`super::Store`]
//! applies it and publishes the result.

use crate::api::{OrderSummary, UserInfo, UserProfile};

/// An observable piece of state with `{ loading, error, data }` shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slice<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub data: T,
}

/// Who is signed in, if anyone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSlice {
    pub user_info: Option<UserInfo>,
}

/// Outcome of the last profile update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateSlice {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
    pub user_info: Option<UserInfo>,
}

/// The whole store. Snapshots of this are what views observe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreState {
    pub session: SessionSlice,
    pub user_details: Slice<Option<UserProfile>>,
    pub my_orders: Slice<Vec<OrderSummary>>,
    pub profile_update: UpdateSlice,
}

impl StoreState {
    /// Bearer token of the signed-in user.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.user_info.as_ref().map(|u| u.token.as_str())
    }
}

/// Something that happened. The only way to change the store.
#[derive(Debug, Clone)]
pub enum Action {
    /// The session identity was (re)established or cleared.
    SessionChanged(Option<UserInfo>),
    /// The visitor signed out; every slice goes back to its default.
    SignedOut,

    DetailsRequest,
    DetailsSuccess(UserProfile),
    DetailsFail(String),

    OrdersRequest,
    OrdersSuccess(Vec<OrderSummary>),
    OrdersFail(String),

    UpdateRequest,
    UpdateSuccess(UserInfo),
    UpdateFail(String),
    UpdateReset,
}

impl Action {
    /// Short name for logs. Payloads can carry tokens, so they are never logged.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SessionChanged(_) => "session_changed",
            Self::SignedOut => "signed_out",
            Self::DetailsRequest => "details_request",
            Self::DetailsSuccess(_) => "details_success",
            Self::DetailsFail(_) => "details_fail",
            Self::OrdersRequest => "orders_request",
            Self::OrdersSuccess(_) => "orders_success",
            Self::OrdersFail(_) => "orders_fail",
            Self::UpdateRequest => "update_request",
            Self::UpdateSuccess(_) => "update_success",
            Self::UpdateFail(_) => "update_fail",
            Self::UpdateReset => "update_reset",
        }
    }
}

/// Apply `action` to `state`, producing the next state.
#[must_use]
pub fn reduce(state: &StoreState, action: Action) -> StoreState {
    let mut next = state.clone();

    match action {
        Action::SessionChanged(user_info) => {
            next.session = SessionSlice { user_info };
        }
        Action::SignedOut => {
            next = StoreState::default();
        }

        Action::DetailsRequest => {
            next.user_details.loading = true;
            next.user_details.error = None;
        }
        Action::DetailsSuccess(profile) => {
            next.user_details = Slice {
                loading: false,
                error: None,
                data: Some(profile),
            };
        }
        Action::DetailsFail(error) => {
            next.user_details = Slice {
                loading: false,
                error: Some(error),
                data: None,
            };
        }

        Action::OrdersRequest => {
            next.my_orders.loading = true;
            next.my_orders.error = None;
        }
        Action::OrdersSuccess(orders) => {
            next.my_orders = Slice {
                loading: false,
                error: None,
                data: orders,
            };
        }
        Action::OrdersFail(error) => {
            next.my_orders = Slice {
                loading: false,
                error: Some(error),
                data: Vec::new(),
            };
        }

        Action::UpdateRequest => {
            next.profile_update = UpdateSlice {
                loading: true,
                ..UpdateSlice::default()
            };
        }
        Action::UpdateSuccess(user_info) => {
            // The API hands back a fresh identity; the session follows it.
            next.session.user_info = Some(user_info.clone());
            next.profile_update = UpdateSlice {
                loading: false,
                error: None,
                success: true,
                user_info: Some(user_info),
            };
        }
        Action::UpdateFail(error) => {
            next.profile_update = UpdateSlice {
                loading: false,
                error: Some(error),
                ..UpdateSlice::default()
            };
        }
        Action::UpdateReset => {
            next.profile_update = UpdateSlice::default();
        }
    }

    next
}
