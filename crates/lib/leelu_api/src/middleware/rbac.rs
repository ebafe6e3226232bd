//! Capability-based authorization.
//!
//! Layered with `from_fn_with_state(Required(&[...]), authorize)` after
//! [`require_auth`](super::auth::require_auth) has run.

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use leelu_core::auth::roles::role_has_all;
use tracing::{debug, error};

use super::auth::AuthenticatedUser;
use crate::error::AppError;

/// Capabilities a route requires. All of them must be held.
#[derive(Debug, Clone, Copy)]
pub struct Required(pub &'static [&'static str]);

pub async fn authorize(
    State(Required(required)): State<Required>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>() else {
        error!(?required, "authorization ran without an authenticated user");
        return Err(AppError::Unauthorized("Authentication required".into()));
    };

    if !role_has_all(user.role, required) {
        debug!(user_id = %user.id, role = %user.role, ?required, "permission denied");
        return Err(AppError::Forbidden("Insufficient permissions".into()));
    }

    Ok(next.run(request).await)
}
