//! Core types for KGP-Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;
pub mod timestamp;

pub use id::*;
pub use price::Price;
pub use status::Milestone;
pub use timestamp::IsoTimestamp;
