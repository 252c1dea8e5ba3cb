//! Authentication route handlers.
//!
//! Login exchanges email and password for a bearer token via the shop API and
//! keeps the resulting identity in the session. Logout forgets it along with
//! the visitor's store.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{CurrentVisitor, clear_user_info, set_user_info};
use crate::routes::account::PROFILE_PATH;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Where to go after signing in.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
    pub redirect: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Visitors who are already signed in go straight to their destination.
pub async fn login_page(
    visitor: CurrentVisitor,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let target = redirect_target(query.redirect.as_deref());
    if visitor.user_info.is_some() {
        return Redirect::to(target).into_response();
    }

    LoginTemplate {
        error: None,
        email: String::new(),
        redirect: target.to_string(),
    }
    .into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let target = redirect_target(form.redirect.as_deref()).to_string();
    let password = SecretString::from(form.password);

    match state.visitors().api().login(&form.email, &password).await {
        Ok(user) => {
            // A new identity starts from an empty store.
            state.visitors().remove(&visitor.visitor_id).await;
            visitor.session.cycle_id().await?;
            set_user_info(&visitor.session, &user).await?;

            set_sentry_user(&user.id, Some(&user.email));
            add_breadcrumb("auth", "Signed in", Some(&[("user_id", user.id.as_str())]));
            tracing::info!(user_id = %user.id, "Shopper signed in");

            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(LoginTemplate {
                error: Some(e.user_message()),
                email: form.email,
                redirect: target,
            }
            .into_response())
        }
    }
}

/// Handle logout.
pub async fn logout(State(state): State<AppState>, visitor: CurrentVisitor) -> Result<Response> {
    state.visitors().remove(&visitor.visitor_id).await;
    clear_user_info(&visitor.session).await?;
    clear_sentry_user();

    if let Some(user) = &visitor.user_info {
        tracing::info!(user_id = %user.id, "Shopper signed out");
    }

    Ok(Redirect::to("/login").into_response())
}

/// Only same-site absolute paths are followed after login.
fn redirect_target(requested: Option<&str>) -> &str {
    requested
        .filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
        .unwrap_or(PROFILE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_defaults_to_profile() {
        assert_eq!(redirect_target(None), "/account/profile");
    }

    #[test]
    fn test_redirect_accepts_local_paths() {
        assert_eq!(redirect_target(Some("/order/abc")), "/order/abc");
    }

    #[test]
    fn test_redirect_rejects_offsite_targets() {
        assert_eq!(redirect_target(Some("https://evil.example")), PROFILE_PATH);
        assert_eq!(redirect_target(Some("//evil.example")), PROFILE_PATH);
        assert_eq!(redirect_target(Some("/\\evil.example")), PROFILE_PATH);
    }

    #[test]
    fn test_login_form_ignores_missing_redirect() {
        let form: LoginForm = serde_json::from_value(serde_json::json!({
            "email": "asha@kgp.in",
            "password": "correct horse",
        }))
        .unwrap_or_else(|e| panic!("form should parse: {e}"));
        assert_eq!(form.redirect, None);
    }
}
