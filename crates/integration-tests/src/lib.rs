//! Integration tests for the KGP-Shop storefront.
//!
//! Tests drive the real [`Router`] in-process with `tower::ServiceExt::oneshot`
//! against [`FakeShop`], an in-memory stand-in for the shop REST API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kgp-shop-integration-tests
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use tower::ServiceExt;
use url::Url;

use kgp_shop_core::{IsoTimestamp, Milestone, OrderId, Price, UserId};
use kgp_shop_storefront::api::{
    ApiError, OrderSummary, ShopApi, UpdateProfileRequest, UserInfo, UserProfile,
};
use kgp_shop_storefront::config::{ShopApiConfig, StorefrontConfig};
use kgp_shop_storefront::routes;
use kgp_shop_storefront::state::AppState;

/// Email of the only account the fake shop knows.
pub const EMAIL: &str = "asha@kgp.in";

/// Password of that account.
pub const PASSWORD: &str = "correct horse";

/// In-memory shop API with a single user and two orders.
///
/// Every login and every profile update issues a fresh token and revokes the
/// previous one.
pub struct FakeShop {
    user: Mutex<UserProfile>,
    token: Mutex<String>,
    issued: AtomicUsize,
    profile_failures: AtomicUsize,
}

impl Default for FakeShop {
    fn default() -> Self {
        Self {
            user: Mutex::new(UserProfile {
                id: UserId::new("u1"),
                name: "Asha".to_string(),
                email: EMAIL.to_string(),
                is_admin: false,
            }),
            token: Mutex::new("token-0".to_string()),
            issued: AtomicUsize::new(0),
            profile_failures: AtomicUsize::new(0),
        }
    }
}

impl FakeShop {
    /// A shop whose profile endpoint is unreachable.
    #[must_use]
    pub fn failing_profile() -> Self {
        Self::flaky_profile(usize::MAX)
    }

    /// A shop whose profile endpoint fails `times` times, then recovers.
    #[must_use]
    pub fn flaky_profile(times: usize) -> Self {
        let shop = Self::default();
        shop.profile_failures.store(times, Ordering::SeqCst);
        shop
    }

    /// Revoke the current token and issue the next one.
    fn rotate_token(&self) {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = format!("token-{n}");
    }

    /// Consume one scheduled profile failure, if any remain.
    fn take_profile_failure(&self) -> bool {
        self.profile_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                (left > 0).then(|| left.saturating_sub(1))
            })
            .is_ok()
    }

    fn user(&self) -> UserProfile {
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn current_token(&self) -> String {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn user_info(&self) -> UserInfo {
        let user = self.user();
        UserInfo {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            token: self.current_token(),
        }
    }

    fn authorize(&self, token: &str) -> Result<(), ApiError> {
        if token == self.current_token() {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                status: 401,
                message: "Not authorized, token failed".to_string(),
            })
        }
    }
}

#[async_trait]
impl ShopApi for FakeShop {
    async fn login(&self, email: &str, password: &SecretString) -> Result<UserInfo, ApiError> {
        if email == self.user().email && password.expose_secret() == PASSWORD {
            self.rotate_token();
            Ok(self.user_info())
        } else {
            Err(ApiError::Rejected {
                status: 401,
                message: "Invalid email or password".to_string(),
            })
        }
    }

    async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.authorize(token)?;
        if self.take_profile_failure() {
            return Err(ApiError::Rejected {
                status: 503,
                message: "Network Error".to_string(),
            });
        }
        Ok(self.user())
    }

    async fn update_profile(
        &self,
        token: &str,
        request: &UpdateProfileRequest,
    ) -> Result<UserInfo, ApiError> {
        self.authorize(token)?;
        {
            let mut user = self.user.lock().unwrap_or_else(PoisonError::into_inner);
            user.name.clone_from(&request.name);
            user.email.clone_from(&request.email);
        }
        self.rotate_token();
        Ok(self.user_info())
    }

    async fn list_own_orders(&self, token: &str) -> Result<Vec<OrderSummary>, ApiError> {
        self.authorize(token)?;
        Ok(vec![
            OrderSummary {
                id: OrderId::new("6470a1b2"),
                created_at: IsoTimestamp::new("2023-05-17T10:00:00Z"),
                total_price: Price::from_cents(12_050),
                paid: Milestone::Pending,
                delivered: Milestone::Pending,
            },
            OrderSummary {
                id: OrderId::new("6470a1c3"),
                created_at: IsoTimestamp::new("2023-06-01T09:30:00Z"),
                total_price: Price::from_cents(4_999),
                paid: Milestone::Reached(Some(IsoTimestamp::new("2023-06-02T12:00:00Z"))),
                delivered: Milestone::Pending,
            },
        ])
    }
}

/// Configuration for in-process tests: plain HTTP, no rate limiting.
///
/// # Panics
///
/// Panics if the hard-coded shop API URL does not parse.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        shop_api: ShopApiConfig {
            base_url: Url::parse("http://127.0.0.1:5000").expect("static URL parses"),
            timeout: Duration::from_secs(1),
        },
        visitor_idle: Duration::from_secs(60),
        rate_limit_auth: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response reduced to what tests assert on.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// The session cookie pair (`name=value`) set by this response, if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("kgp_session="))
            .and_then(|v| v.split(';').next())
            .map(ToOwned::to_owned)
    }
}

/// The storefront router wired to a [`FakeShop`].
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Build the app around a default fake shop.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shop(FakeShop::default())
    }

    /// Build the app around a specific fake shop.
    #[must_use]
    pub fn with_shop(shop: FakeShop) -> Self {
        let state = AppState::new(test_config(), Arc::new(shop));
        Self {
            router: routes::app(state),
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body is not UTF-8.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).expect("body is UTF-8"),
        }
    }

    /// `GET` a path, optionally with a session cookie and as an HTMX request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn get(&self, path: &str, cookie: Option<&str>, htmx: bool) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        self.send(builder.body(Body::empty()).expect("request builds"))
            .await
    }

    /// `POST` an urlencoded form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post_form(&self, path: &str, cookie: Option<&str>, form: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_owned())).expect("request builds"))
            .await
    }

    /// Sign in as the fake shop's user and return the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login does not succeed.
    pub async fn login(&self) -> String {
        self.login_with(None).await
    }

    /// Sign in again from an existing session and return the new cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login does not succeed.
    pub async fn login_with(&self, cookie: Option<&str>) -> String {
        let response = self
            .post_form("/login", cookie, "email=asha%40kgp.in&password=correct+horse")
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        response.session_cookie().expect("login sets a session cookie")
    }

    /// Poll the profile panel until its body satisfies `done`.
    ///
    /// # Panics
    ///
    /// Panics if the condition is not met within a second.
    pub async fn poll_panel(&self, cookie: &str, done: impl Fn(&str) -> bool) -> TestResponse {
        for _ in 0..100 {
            let response = self.get("/account/profile/panel", Some(cookie), true).await;
            if done(&response.body) {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("profile panel never reached the expected state");
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
