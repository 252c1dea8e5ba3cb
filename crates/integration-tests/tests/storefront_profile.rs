//! Integration tests for login and the account profile screen.
//!
//! Run with: cargo test -p kgp-shop-integration-tests

use axum::http::StatusCode;
use kgp_shop_integration_tests::{FakeShop, TestApp};

// ============================================================================
// Health and security headers
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.get("/health", None, false).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();
    let response = app.get("/health", None, false).await;

    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(
        response.headers.get("x-frame-options").map(|v| v.as_bytes()),
        Some(&b"DENY"[..])
    );
    assert!(response.headers.contains_key("content-security-policy"));
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::new();
    let response = app.get("/login", None, false).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Sign In"));
    assert!(response.body.contains(r#"name="redirect""#));
}

#[tokio::test]
async fn test_login_with_wrong_password_shows_api_message() {
    let app = TestApp::new();
    let response = app
        .post_form("/login", None, "email=asha%40kgp.in&password=nope")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Invalid email or password"));
    assert!(response.body.contains(r#"value="asha@kgp.in""#));
}

#[tokio::test]
async fn test_login_redirects_to_profile() {
    let app = TestApp::new();
    let response = app
        .post_form("/login", None, "email=asha%40kgp.in&password=correct+horse")
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/account/profile"));
    assert!(response.session_cookie().is_some());
}

#[tokio::test]
async fn test_signed_in_visitor_skips_login_page() {
    let app = TestApp::new();
    let cookie = app.login().await;
    let response = app.get("/login", Some(&cookie), false).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/account/profile"));
}

// ============================================================================
// Profile screen
// ============================================================================

#[tokio::test]
async fn test_anonymous_profile_redirects_to_login() {
    let app = TestApp::new();
    let response = app.get("/account/profile", None, false).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/login"));
}

#[tokio::test]
async fn test_anonymous_panel_asks_htmx_to_redirect() {
    let app = TestApp::new();
    let response = app.get("/account/profile/panel", None, true).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get("hx-redirect").map(|v| v.as_bytes()),
        Some(&b"/login"[..])
    );
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_profile_first_visit_shows_loaders_and_polls() {
    let app = TestApp::new();
    let cookie = app.login().await;
    let response = app.get("/account/profile", Some(&cookie), false).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<title>KGP-SHOP | Profile</title>"));
    assert!(response.body.contains("Loading..."));
    assert!(response.body.contains(r#"hx-get="/account/profile/panel""#));
}

#[tokio::test]
async fn test_profile_loads_form_and_orders() {
    let app = TestApp::new();
    let cookie = app.login().await;
    app.get("/account/profile", Some(&cookie), false).await;

    let panel = app
        .poll_panel(&cookie, |body| {
            body.contains(r#"value="Asha""#) && body.contains("6470a1c3")
        })
        .await;

    assert!(panel.body.contains(r#"value="asha@kgp.in""#));
    assert!(panel.body.contains("2023-05-17"));
    assert!(panel.body.contains("2023-06-02"));
    assert!(panel.body.contains(r#"aria-label="Not paid""#));
    assert!(panel.body.contains("Details"));
    assert!(!panel.body.contains("hx-get"));
}

#[tokio::test]
async fn test_profile_fetch_error_is_shown() {
    let app = TestApp::with_shop(FakeShop::failing_profile());
    let cookie = app.login().await;
    app.get("/account/profile", Some(&cookie), false).await;

    let panel = app
        .poll_panel(&cookie, |body| {
            body.contains("Network Error") && body.contains("6470a1b2")
        })
        .await;

    assert!(!panel.body.contains(r#"name="confirm_password""#));
}

#[tokio::test]
async fn test_reloading_page_retries_failed_profile_fetch() {
    let app = TestApp::with_shop(FakeShop::flaky_profile(1));
    let cookie = app.login().await;
    app.get("/account/profile", Some(&cookie), false).await;
    app.poll_panel(&cookie, |body| {
        body.contains("Network Error") && body.contains("6470a1b2")
    })
    .await;

    // Polling the panel alone does not retry.
    let panel = app.get("/account/profile/panel", Some(&cookie), true).await;
    assert!(panel.body.contains("Network Error"));

    let reloaded = app.get("/account/profile", Some(&cookie), false).await;
    assert_eq!(reloaded.status, StatusCode::OK);
    assert!(reloaded.body.contains(r#"hx-get="/account/profile/panel""#));

    let panel = app
        .poll_panel(&cookie, |body| body.contains(r#"value="Asha""#))
        .await;
    assert!(!panel.body.contains("Network Error"));
}

#[tokio::test]
async fn test_signing_in_again_uses_the_new_token() {
    let app = TestApp::new();
    let cookie = app.login().await;
    app.get("/account/profile", Some(&cookie), false).await;
    app.poll_panel(&cookie, |body| body.contains("6470a1c3"))
        .await;

    // Same user, fresh token; the previous one is revoked by the shop.
    let cookie = app.login_with(Some(&cookie)).await;
    app.get("/account/profile", Some(&cookie), false).await;

    let panel = app
        .poll_panel(&cookie, |body| {
            body.contains(r#"value="Asha""#) && body.contains("6470a1c3")
        })
        .await;
    assert!(!panel.body.contains("Not authorized"));
}

#[tokio::test]
async fn test_password_mismatch_is_reported() {
    let app = TestApp::new();
    let cookie = app.login().await;
    app.get("/account/profile", Some(&cookie), false).await;
    app.poll_panel(&cookie, |body| body.contains(r#"value="Asha""#))
        .await;

    let response = app
        .post_form(
            "/account/profile",
            Some(&cookie),
            "name=Asha&email=asha%40kgp.in&password=one&confirm_password=two",
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Passwords do not match!"));
    assert!(!response.body.contains("Profile Updated"));
}

#[tokio::test]
async fn test_profile_update_refreshes_form() {
    let app = TestApp::new();
    let cookie = app.login().await;
    app.get("/account/profile", Some(&cookie), false).await;
    app.poll_panel(&cookie, |body| body.contains(r#"value="Asha""#))
        .await;

    let response = app
        .post_form(
            "/account/profile",
            Some(&cookie),
            "name=Asha+K&email=asha%40kgp.in&password=s3cret&confirm_password=s3cret",
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let updated = app
        .poll_panel(&cookie, |body| body.contains("Profile Updated Successfully"))
        .await;
    assert!(!updated.body.contains("s3cret"));

    let settled = app
        .poll_panel(&cookie, |body| body.contains(r#"value="Asha K""#))
        .await;
    assert!(!settled.body.contains("Profile Updated"));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_forgets_the_visitor() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let response = app.post_form("/logout", Some(&cookie), "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/login"));

    let profile = app.get("/account/profile", Some(&cookie), false).await;
    assert_eq!(profile.status, StatusCode::SEE_OTHER);
    assert_eq!(profile.location(), Some("/login"));
}
