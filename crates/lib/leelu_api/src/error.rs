//! Application error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leelu_core::auth::AuthError;
use leelu_core::store::EMAIL_UNIQUE;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body or query string could not be decoded.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message, details) = match self {
            AppError::Validation(m) => ("validation_error", m, None),
            AppError::MalformedRequest(detail) => (
                "validation_error",
                "Validation failed".to_string(),
                Some(serde_json::Value::String(detail)),
            ),
            AppError::NotFound(m) => ("not_found", m, None),
            AppError::Unauthorized(m) => ("unauthorized", m, None),
            AppError::Forbidden(m) => ("forbidden", m, None),
            AppError::Internal(cause) => {
                error!(%cause, "request failed");
                ("internal_error", "Internal server error".to_string(), None)
            }
        };
        let body = Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            message,
            details,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::TokenExpired => AppError::Unauthorized("Token has expired".into()),
            AuthError::TokenMalformed(_) | AuthError::TokenTypeMismatch { .. } => {
                AppError::Unauthorized("Invalid token".into())
            }
            AuthError::UserNotFound => AppError::NotFound("User not found".into()),
            AuthError::AccountDisabled | AuthError::AccountBlocked => {
                AppError::Forbidden(e.to_string())
            }
            AuthError::AccountRemoved => AppError::Unauthorized(e.to_string()),
            AuthError::PermissionDenied(_) => {
                AppError::Forbidden("Insufficient permissions".into())
            }
            AuthError::SelfAction(_) | AuthError::MissingEmail | AuthError::MissingIdentity => {
                AppError::Validation(e.to_string())
            }
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::UniqueViolation(constraint) if constraint == EMAIL_UNIQUE => {
                AppError::Validation("Email already exists".into())
            }
            AuthError::UniqueViolation(constraint) => {
                AppError::Validation(format!("Duplicate value violates {constraint}"))
            }
            AuthError::Config(msg) | AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_unauthorized_never_internal() {
        let expired = AppError::from(AuthError::TokenExpired);
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert!(matches!(expired, AppError::Unauthorized(ref m) if m == "Token has expired"));

        let bad = AppError::from(AuthError::TokenMalformed("garbage".into()));
        assert!(matches!(bad, AppError::Unauthorized(ref m) if m == "Invalid token"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::from(AuthError::PermissionDenied("blockUser".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::SelfAction("block")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::AccountBlocked).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::AccountRemoved).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Internal("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn email_conflict_reads_as_validation() {
        let err = AppError::from(AuthError::UniqueViolation(EMAIL_UNIQUE.into()));
        assert!(matches!(err, AppError::Validation(ref m) if m == "Email already exists"));
    }
}
