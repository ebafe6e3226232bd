//! Business logic shared by handlers and middleware.

pub mod auth;
pub mod cookies;
pub mod oauth;
