//! Domain models for storefront.
//!
//! Shop data (users, orders) lives in [`crate::api::types`]; this module only
//! holds what the storefront itself keeps in the session.

pub mod session;

pub use session::keys as session_keys;
