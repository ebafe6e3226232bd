//! Request handlers.

pub mod admin;
pub mod health;
pub mod oauth;
pub mod user;

use crate::error::AppError;

/// JSON 404 for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}
