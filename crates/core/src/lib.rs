//! KGP-Shop Core - Shared types library.
//!
//! This crate provides the domain types shared by the storefront and its
//! integration tests:
//! - identifiers handed out by the shop API
//! - order totals and timestamps as the API reports them
//! - paid / delivered milestones for order summaries
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
