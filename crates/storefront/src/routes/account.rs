//! Account profile route handlers.
//!
//! The page and its HTMX panel are two views of the same visitor state. A full
//! page load mounts the screen afresh; panel polls continue where the last
//! request left off. Each request syncs the visitor's store with the session
//! cookie, drives the [`ProfileView`](crate::profile::ProfileView) with a store
//! snapshot, runs whatever effects come back, and renders.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::UserInfo;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CurrentVisitor, set_user_info};
use crate::profile::{Effect, FormField, Frame, LOGIN_PATH, ProfileRender};
use crate::state::AppState;
use crate::store::{Action, Store};

/// Path of the full profile page.
pub const PROFILE_PATH: &str = "/account/profile";

// =============================================================================
// Form Types
// =============================================================================

/// Profile form data.
#[derive(Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Full profile page.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfilePageTemplate {
    pub view: ProfileRender,
    pub poll: bool,
    pub user_name: String,
}

/// Profile panel fragment, swapped in by HTMX.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile_panel.html")]
pub struct ProfilePanelTemplate {
    pub view: ProfileRender,
    pub poll: bool,
}

/// Which representation to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Page,
    Panel,
}

impl Screen {
    fn for_request(headers: &HeaderMap) -> Self {
        if is_htmx(headers) {
            Self::Panel
        } else {
            Self::Page
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the profile page.
pub async fn profile_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    visitor: CurrentVisitor,
) -> Result<Response> {
    show(&state, &headers, visitor, None, Screen::Page).await
}

/// Display the profile panel fragment (polled while data is pending).
pub async fn profile_panel(
    State(state): State<AppState>,
    headers: HeaderMap,
    visitor: CurrentVisitor,
) -> Result<Response> {
    show(&state, &headers, visitor, None, Screen::Panel).await
}

/// Handle profile form submission.
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    visitor: CurrentVisitor,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let screen = Screen::for_request(&headers);
    show(&state, &headers, visitor, Some(form), screen).await
}

/// Drive the visitor's profile view for one request.
async fn show(
    state: &AppState,
    headers: &HeaderMap,
    visitor: CurrentVisitor,
    submitted: Option<ProfileForm>,
    screen: Screen,
) -> Result<Response> {
    let entry = state.visitors().get_or_create(&visitor.visitor_id).await;
    sync_session(&entry.store, visitor.user_info.as_ref());

    let mut view = entry.profile.lock().await;

    // A full page load opens the screen anew; panel polls and submits don't.
    if screen == Screen::Page && submitted.is_none() {
        view.mount();
    }

    if let Some(form) = submitted {
        view.input(FormField::Name, form.name);
        view.input(FormField::Email, form.email);
        view.input(FormField::Password, form.password);
        view.input(FormField::ConfirmPassword, form.confirm_password);

        add_breadcrumb("profile", "Submitted profile form", None);
        let effects = view.submit(&entry.store.snapshot());
        if let Some(path) = execute(&entry.store, effects) {
            return Ok(redirect(headers, path));
        }
    }

    let frame = view.evaluate(&entry.store.snapshot());
    let awaiting = frame.awaiting_data();
    let Frame { effects, render } = frame;

    if let Some(path) = execute(&entry.store, effects) {
        return Ok(redirect(headers, path));
    }
    let Some(observed) = render else {
        return Ok(redirect(headers, LOGIN_PATH));
    };

    // Show the loaders for fetches just started; the success banner belongs
    // to the response that observed it.
    let mut render = view.render(&entry.store.snapshot());
    render.update_succeeded |= observed.update_succeeded;
    drop(view);
    let poll = awaiting || render.is_pending();

    persist_session(&visitor.session, visitor.user_info.as_ref(), &entry.store).await?;

    let response = match screen {
        Screen::Page => ProfilePageTemplate {
            view: render,
            poll,
            user_name: entry
                .store
                .snapshot()
                .session
                .user_info
                .map(|user| user.name)
                .unwrap_or_default(),
        }
        .into_response(),
        Screen::Panel => ProfilePanelTemplate { view: render, poll }.into_response(),
    };
    Ok(response)
}

/// Run commands on the store; return the redirect target if one was asked for.
fn execute(store: &Store, effects: Vec<Effect>) -> Option<&'static str> {
    let mut redirect = None;
    for effect in effects {
        match effect {
            Effect::Redirect(path) => redirect = Some(path),
            Effect::Command(command) => store.run(command),
        }
    }
    redirect
}

/// Bring the store's session slice in line with the session cookie.
///
/// The cookie decides whether someone is signed in and who. When both agree
/// on the user, the store's copy is newer (a profile update refreshes it) and
/// is left alone.
pub(crate) fn sync_session(store: &Store, signed_in: Option<&UserInfo>) {
    let current = store.snapshot().session.user_info;
    match (signed_in, current) {
        (None, Some(_)) => store.dispatch(Action::SignedOut),
        (Some(user), None) => store.dispatch(Action::SessionChanged(Some(user.clone()))),
        (Some(user), Some(current)) if user.id != current.id => {
            store.dispatch(Action::SignedOut);
            store.dispatch(Action::SessionChanged(Some(user.clone())));
        }
        _ => {}
    }
}

/// Write the store's identity back to the session cookie when it changed.
async fn persist_session(
    session: &Session,
    stored: Option<&UserInfo>,
    store: &Store,
) -> Result<()> {
    let Some(latest) = store.snapshot().session.user_info else {
        return Ok(());
    };
    if stored != Some(&latest) {
        tracing::debug!(user_id = %latest.id, "Refreshing session identity");
        set_user_info(session, &latest).await?;
    }
    Ok(())
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Redirect, telling HTMX to navigate the whole page for fragment requests.
fn redirect(headers: &HeaderMap, to: &'static str) -> Response {
    if is_htmx(headers) {
        let mut response = StatusCode::OK.into_response();
        response
            .headers_mut()
            .insert("hx-redirect", HeaderValue::from_static(to));
        response
    } else {
        Redirect::to(to).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::testing::{FakeShopApi, user_info};

    fn store() -> Store {
        Store::new(Arc::new(FakeShopApi::default()))
    }

    #[test]
    fn test_sync_signs_in_from_cookie() {
        let store = store();
        sync_session(&store, Some(&user_info()));
        assert_eq!(store.snapshot().session.user_info, Some(user_info()));
    }

    #[test]
    fn test_sync_signs_out_when_cookie_is_gone() {
        let store = store();
        store.dispatch(Action::SessionChanged(Some(user_info())));
        sync_session(&store, None);
        assert_eq!(store.snapshot().session.user_info, None);
    }

    #[test]
    fn test_sync_keeps_refreshed_identity_for_same_user() {
        let store = store();
        let mut refreshed = user_info();
        refreshed.token = "token-2".to_string();
        store.dispatch(Action::SessionChanged(Some(refreshed.clone())));

        sync_session(&store, Some(&user_info()));
        assert_eq!(store.snapshot().session.user_info, Some(refreshed));
    }

    #[test]
    fn test_sync_resets_state_for_different_user() {
        let store = store();
        store.dispatch(Action::SessionChanged(Some(user_info())));
        store.dispatch(Action::OrdersRequest);

        let mut other = user_info();
        other.id = "u2".into();
        sync_session(&store, Some(&other));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.session.user_info, Some(other));
        assert!(!snapshot.my_orders.loading);
    }

    #[test]
    fn test_htmx_redirect_uses_header() {
        let mut headers = HeaderMap::new();
        headers.insert("hx-request", HeaderValue::from_static("true"));
        let response = redirect(&headers, LOGIN_PATH);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("hx-redirect"),
            Some(&HeaderValue::from_static("/login"))
        );
    }

    #[test]
    fn test_plain_redirect_is_see_other() {
        let response = redirect(&HeaderMap::new(), LOGIN_PATH);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
