//! Shop REST API client.
//!
//! # Architecture
//!
//! - The shop API is the source of truth for users and orders - no local
//!   persistence, direct API calls only
//! - [`ShopApi`] is the seam the store executes commands against, so tests can
//!   swap in a fake
//! - [`HttpShopApi`] is the production implementation over `reqwest`
//!
//! # Endpoints
//!
//! ```text
//! POST /api/users/login     - Exchange credentials for a bearer token
//! GET  /api/users/profile   - Current user's profile
//! PUT  /api/users/profile   - Update name, email, password
//! GET  /api/orders/myorders - Current user's orders
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kgp_shop_storefront::api::{HttpShopApi, ShopApi};
//!
//! let api = HttpShopApi::new(&config.shop_api)?;
//! let user = api.login("asha@kgp.in", &password).await?;
//! let orders = api.list_own_orders(&user.token).await?;
//! ```

mod client;
pub mod types;

pub use client::HttpShopApi;
pub use types::*;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when talking to the shop API.
///
/// The `Display` text follows the API's own wording rather than the
/// transport's. [`ApiError::user_message`] is what shoppers see.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (connection refused, timeout, DNS).
    #[error("Network Error")]
    Network(#[source] reqwest::Error),

    /// The API rejected the request and explained why.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the API's error body.
        message: String,
    },

    /// The API returned a non-success status without a message.
    #[error("Request failed with status code {0}")]
    Status(u16),

    /// The response body did not match the expected shape.
    #[error("Invalid response from shop API: {0}")]
    Decode(String),

    /// A user-scoped call was attempted without a session.
    #[error("Not authorized, no token")]
    NoToken,

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Shown to shoppers when the API answered with something unreadable.
pub const UNREADABLE_RESPONSE: &str = "Unexpected response from the shop";

impl ApiError {
    /// The message shown to the shopper for this failure.
    ///
    /// Parser and client construction details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode(_) | Self::Client(_) => UNREADABLE_RESPONSE.to_string(),
            Self::Network(_) | Self::Rejected { .. } | Self::Status(_) | Self::NoToken => {
                self.to_string()
            }
        }
    }
}

/// Operations the storefront needs from the shop API.
#[async_trait]
pub trait ShopApi: Send + Sync {
    /// Authenticate with email and password.
    async fn login(&self, email: &str, password: &SecretString) -> Result<UserInfo, ApiError>;

    /// Fetch the profile of the user owning `token`.
    async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError>;

    /// Update the profile of the user owning `token`.
    ///
    /// Returns the refreshed identity (with a new token).
    async fn update_profile(
        &self,
        token: &str,
        request: &UpdateProfileRequest,
    ) -> Result<UserInfo, ApiError>;

    /// List the orders placed by the user owning `token`.
    async fn list_own_orders(&self, token: &str) -> Result<Vec<OrderSummary>, ApiError>;
}
