//! # leelu_core
//!
//! Core domain logic for Leelu: user accounts, signed tokens, roles and
//! federated sign-in. Has no HTTP surface of its own.

pub mod auth;
pub mod db;
pub mod models;
pub mod oauth;
pub mod store;
pub mod users;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
