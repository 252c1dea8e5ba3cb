//! `reqwest` implementation of [`ShopApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::types::{ErrorBody, LoginRequest};
use super::{ApiError, OrderSummary, ShopApi, UpdateProfileRequest, UserInfo, UserProfile};
use crate::config::ShopApiConfig;

/// Client for the shop REST API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct HttpShopApi {
    inner: Arc<HttpShopApiInner>,
}

struct HttpShopApiInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShopApi {
    /// Create a new shop API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` if the HTTP client cannot be built.
    pub fn new(config: &ShopApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(HttpShopApiInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            }),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        self.inner.client.request(method, url)
    }

    /// Send a request and decode a JSON success body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Shop API request failed");
            ApiError::Network(e)
        })?;

        let response = check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into an [`ApiError`].
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // Get response body as text first for better error diagnostics
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Shop API returned non-success status"
    );

    Err(error_from_body(status.as_u16(), &body))
}

/// Prefer the API's own `message`; fall back to the status code.
fn error_from_body(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
        }) if !message.is_empty() => ApiError::Rejected { status, message },
        _ => ApiError::Status(status),
    }
}

#[async_trait]
impl ShopApi for HttpShopApi {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &SecretString) -> Result<UserInfo, ApiError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        self.send(self.request(Method::POST, "/api/users/login").json(&body))
            .await
    }

    #[instrument(skip_all)]
    async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.send(
            self.request(Method::GET, "/api/users/profile")
                .bearer_auth(token),
        )
        .await
    }

    #[instrument(skip_all, fields(user_id = %request.id))]
    async fn update_profile(
        &self,
        token: &str,
        request: &UpdateProfileRequest,
    ) -> Result<UserInfo, ApiError> {
        self.send(
            self.request(Method::PUT, "/api/users/profile")
                .bearer_auth(token)
                .json(request),
        )
        .await
    }

    #[instrument(skip_all)]
    async fn list_own_orders(&self, token: &str) -> Result<Vec<OrderSummary>, ApiError> {
        self.send(
            self.request(Method::GET, "/api/orders/myorders")
                .bearer_auth(token),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;

    #[test]
    fn test_error_from_body_uses_api_message() {
        let err = error_from_body(404, r#"{"message":"User not found","stack":null}"#);
        assert!(matches!(err, ApiError::Rejected { status: 404, .. }));
        assert_eq!(err.user_message(), "User not found");
    }

    #[test]
    fn test_error_from_body_falls_back_to_status() {
        assert_eq!(
            error_from_body(502, "<html>Bad Gateway</html>").user_message(),
            "Request failed with status code 502"
        );
        assert_eq!(
            error_from_body(500, r#"{"message":""}"#).user_message(),
            "Request failed with status code 500"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = HttpShopApi::new(&ShopApiConfig {
            base_url: Url::parse("http://localhost:5000/").unwrap(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(api.inner.base_url, "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_unreachable_api_reports_network_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let api = HttpShopApi::new(&ShopApiConfig {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = api.get_profile("token").await.unwrap_err();
        assert_eq!(err.user_message(), "Network Error");
    }
}
