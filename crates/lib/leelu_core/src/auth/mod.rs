//! Authentication and authorization logic.
//!
//! Provides token issuance/verification, federated identity reconciliation
//! and the static role/permission model, shared by `leelu_api` and the
//! server binary.

pub mod identity;
pub mod jwt;
pub mod roles;

use thiserror::Error;

use crate::models::auth::TokenKind;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Malformed token: {0}")]
    TokenMalformed(String),

    #[error("Token type mismatch: expected {expected}, got {found}")]
    TokenTypeMismatch { expected: TokenKind, found: TokenKind },

    #[error("No email found in identity provider profile")]
    MissingEmail,

    #[error("No provider id found in identity provider profile")]
    MissingIdentity,

    #[error("User not found")]
    UserNotFound,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("User account has been removed")]
    AccountRemoved,

    #[error("Account is blocked")]
    AccountBlocked,

    #[error("Forbidden: missing permission '{0}'")]
    PermissionDenied(String),

    #[error("Cannot {0} yourself")]
    SelfAction(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    DbError(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AuthError::UniqueViolation(db.constraint().unwrap_or("unknown").to_string())
            }
            _ => AuthError::DbError(e),
        }
    }
}
