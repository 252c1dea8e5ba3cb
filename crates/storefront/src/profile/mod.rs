//! The account profile screen.
//!
//! [`ProfileView`] owns the profile form's local state and turns store
//! snapshots into two outputs:
//!
//! - effects to issue ([`Effect`]): a redirect, or commands for the store
//! - a render model ([`ProfileRender`])
//!
//! It never performs I/O itself. The caller executes the effects and the view
//! reacts to whatever the store reports afterwards.
//!
//! # Reconciliation
//!
//! Runs on [`ProfileView::mount`] and again whenever the session identity, the
//! fetched profile, or the update success flag differs from what the view last
//! saw:
//!
//! ```text
//! no session                          -> redirect to /login
//! profile missing/incomplete, or
//! last update succeeded               -> reset update flag, fetch profile, fetch orders
//! otherwise                           -> copy name + email into the form
//! ```

pub mod render;

pub use render::{OrderRow, OrdersArea, ProfileArea, ProfileFields, ProfileRender, StatusCell};

use secrecy::{ExposeSecret, SecretString};

use crate::api::{UpdateProfileRequest, UserInfo, UserProfile};
use crate::store::{Command, StoreState};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Shown when the two password inputs differ.
pub const PASSWORD_MISMATCH: &str = "Passwords do not match!";

/// A side effect requested by the view.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Navigate elsewhere.
    Redirect(&'static str),
    /// Ask the store to do something.
    Command(Command),
}

/// Result of evaluating the view against one snapshot.
#[derive(Debug, Clone)]
pub struct Frame {
    pub effects: Vec<Effect>,
    /// `None` when the visitor is being redirected away.
    pub render: Option<ProfileRender>,
}

impl Frame {
    /// The redirect target, if the view asked to navigate away.
    #[must_use]
    pub fn redirect(&self) -> Option<&'static str> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Redirect(path) => Some(*path),
            Effect::Command(_) => None,
        })
    }

    /// Whether the page should poll for fresh data.
    #[must_use]
    pub fn awaiting_data(&self) -> bool {
        self.render.as_ref().is_some_and(ProfileRender::is_pending)
            || self
                .effects
                .iter()
                .any(|effect| matches!(effect, Effect::Command(_)))
    }
}

/// A form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

/// The form's local state. Only this view mutates it.
#[derive(Debug, Clone)]
pub struct LocalForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl Default for LocalForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: SecretString::from(""),
            confirm_password: SecretString::from(""),
        }
    }
}

impl LocalForm {
    fn passwords_match(&self) -> bool {
        self.password.expose_secret() == self.confirm_password.expose_secret()
    }
}

/// The slice values reconciliation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dependencies {
    user_info: Option<UserInfo>,
    profile: Option<UserProfile>,
    update_succeeded: bool,
}

impl Dependencies {
    fn of(state: &StoreState) -> Self {
        Self {
            user_info: state.session.user_info.clone(),
            profile: state.user_details.data.clone(),
            update_succeeded: state.profile_update.success,
        }
    }
}

/// The profile screen.
#[derive(Debug, Default)]
pub struct ProfileView {
    form: LocalForm,
    message: Option<String>,
    last_seen: Option<Dependencies>,
}

impl ProfileView {
    /// The current form contents.
    #[must_use]
    pub const fn form(&self) -> &LocalForm {
        &self.form
    }

    /// The local validation message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Start over as a freshly opened screen.
    ///
    /// Clears the form and any message, and forgets the last seen
    /// dependencies so the next evaluation reconciles again.
    pub fn mount(&mut self) {
        *self = Self::default();
    }

    /// Apply a keystroke-level change to one input.
    pub fn input(&mut self, field: FormField, value: String) {
        match field {
            FormField::Name => self.form.name = value,
            FormField::Email => self.form.email = value,
            FormField::Password => self.form.password = SecretString::from(value),
            FormField::ConfirmPassword => self.form.confirm_password = SecretString::from(value),
        }
    }

    /// Evaluate the view against a store snapshot.
    ///
    /// Reconciliation effects are only produced when the dependencies changed
    /// since the previous evaluation. A missing session always redirects.
    pub fn evaluate(&mut self, state: &StoreState) -> Frame {
        if state.session.user_info.is_none() {
            // Behave like a fresh mount when the visitor comes back.
            self.last_seen = None;
            return Frame {
                effects: vec![Effect::Redirect(LOGIN_PATH)],
                render: None,
            };
        }

        let deps = Dependencies::of(state);
        let effects = if self.last_seen.as_ref() == Some(&deps) {
            Vec::new()
        } else {
            let effects = self.reconcile(state);
            self.last_seen = Some(deps);
            effects
        };

        Frame {
            effects,
            render: Some(self.render(state)),
        }
    }

    /// Fetch when data is stale or absent; otherwise seed the form.
    fn reconcile(&mut self, state: &StoreState) -> Vec<Effect> {
        match &state.user_details.data {
            Some(profile) if profile.is_complete() && !state.profile_update.success => {
                self.form.name.clone_from(&profile.name);
                self.form.email.clone_from(&profile.email);
                Vec::new()
            }
            _ => vec![
                Effect::Command(Command::ResetUpdateFlag),
                Effect::Command(Command::FetchProfile),
                Effect::Command(Command::FetchOrders),
            ],
        }
    }

    /// Validate the form and request a profile update.
    ///
    /// On a password mismatch, sets [`PASSWORD_MISMATCH`] and returns no
    /// effects. Empty passwords are passed through unchanged.
    pub fn submit(&mut self, state: &StoreState) -> Vec<Effect> {
        if !self.form.passwords_match() {
            self.message = Some(PASSWORD_MISMATCH.to_string());
            return Vec::new();
        }

        let id = match (&state.user_details.data, &state.session.user_info) {
            (Some(profile), _) => profile.id.clone(),
            (None, Some(user_info)) => user_info.id.clone(),
            (None, None) => return vec![Effect::Redirect(LOGIN_PATH)],
        };

        vec![Effect::Command(Command::UpdateProfile(UpdateProfileRequest {
            id,
            name: self.form.name.clone(),
            email: self.form.email.clone(),
            password: self.form.password.clone(),
        }))]
    }

    /// Build the render model for a snapshot.
    #[must_use]
    pub fn render(&self, state: &StoreState) -> ProfileRender {
        let details = &state.user_details;
        let profile = if details.loading {
            ProfileArea::Loading
        } else if let Some(error) = &details.error {
            ProfileArea::Failed(error.clone())
        } else {
            ProfileArea::Ready(ProfileFields {
                name: self.form.name.clone(),
                email: self.form.email.clone(),
            })
        };

        let orders = &state.my_orders;
        let orders = if orders.loading {
            OrdersArea::Loading
        } else if let Some(error) = &orders.error {
            OrdersArea::Failed(error.clone())
        } else {
            OrdersArea::Table(orders.data.iter().map(OrderRow::from).collect())
        };

        let update = &state.profile_update;
        ProfileRender {
            message: self.message.clone(),
            update_succeeded: update.success,
            update_error: update.error.clone(),
            update_in_flight: update.loading,
            profile,
            orders,
        }
    }
}
