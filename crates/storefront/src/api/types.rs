//! Wire types for the shop REST API.
//!
//! The API speaks camelCase JSON with document-style `_id` keys.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use kgp_shop_core::{IsoTimestamp, Milestone, OrderId, Price, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticated identity returned by login and profile update.
///
/// This is what the session holds. `Debug` redacts the bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub token: String,
}

impl fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// A user's profile as returned by `GET /api/users/profile`.
///
/// The API never returns a password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserProfile {
    /// A profile without a name has not been fully loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Body of `POST /api/users/login`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `PUT /api/users/profile`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateProfileRequest {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// An order as listed by `GET /api/orders/myorders`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "OrderRecord")]
pub struct OrderSummary {
    pub id: OrderId,
    pub created_at: IsoTimestamp,
    pub total_price: Price,
    pub paid: Milestone,
    pub delivered: Milestone,
}

/// Raw order JSON. Only the fields the order history needs are read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
    #[serde(rename = "_id")]
    id: OrderId,
    created_at: IsoTimestamp,
    #[serde(default)]
    total_price: Price,
    #[serde(default)]
    is_paid: bool,
    paid_at: Option<IsoTimestamp>,
    #[serde(default)]
    is_delivered: bool,
    delivered_at: Option<IsoTimestamp>,
}

impl From<OrderRecord> for OrderSummary {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            total_price: record.total_price,
            paid: Milestone::from_flag(record.is_paid, record.paid_at),
            delivered: Milestone::from_flag(record.is_delivered, record.delivered_at),
        }
    }
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_summary_from_api_json() {
        let json = r#"{
            "_id": "6470a1b2c3d4e5f601234567",
            "user": "646f00000000000000000001",
            "createdAt": "2023-05-17T10:00:00.000Z",
            "totalPrice": 89.99,
            "isPaid": true,
            "paidAt": "2023-05-18T08:00:00.000Z",
            "isDelivered": false
        }"#;

        let order: OrderSummary = serde_json::from_str(json).unwrap();
        assert_eq!(order.id.as_str(), "6470a1b2c3d4e5f601234567");
        assert_eq!(order.created_at.calendar_date(), "2023-05-17");
        assert_eq!(order.total_price.to_string(), "89.99");
        assert_eq!(order.paid.calendar_date(), Some("2023-05-18"));
        assert_eq!(order.delivered, Milestone::Pending);
    }

    #[test]
    fn test_user_profile_never_carries_password() {
        let json = r#"{"_id":"u1","name":"Asha","email":"asha@kgp.in","isAdmin":false,"password":"hash"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name, "Asha");
        assert!(profile.is_complete());
        assert!(!UserProfile::default().is_complete());
    }

    #[test]
    fn test_user_info_debug_redacts_token() {
        let info = UserInfo {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@kgp.in".to_string(),
            is_admin: false,
            token: "eyJhbGciOiJIUzI1NiJ9.secret".to_string(),
        };
        let debug = format!("{info:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("eyJhbGciOiJIUzI1NiJ9"));
    }

    #[test]
    fn test_update_request_serializes_password() {
        let request = UpdateProfileRequest {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@kgp.in".to_string(),
            password: SecretString::from("hunter22"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["password"], "hunter22");
    }
}
