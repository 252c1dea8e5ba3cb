//! Session-related types.
//!
//! Keys for data stored in the tower-sessions session.

/// Session keys for authentication and visitor data.
pub mod keys {
    /// Key for the signed-in user's identity (`UserInfo`).
    pub const USER_INFO: &str = "user_info";

    /// Key for the opaque visitor id that selects the visitor's store.
    pub const VISITOR_ID: &str = "visitor_id";
}
