//! Authentication middleware.
//!
//! Resolves the caller from an access token and injects the stored
//! [`User`] into request extensions. Handlers behind this layer read it with
//! `Extension<AuthenticatedUser>`.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use leelu_core::models::user::User;

use crate::AppState;
use crate::error::AppError;
use crate::services::{auth::authenticate_token, cookies::TOKEN_COOKIE};

/// Fallback header for clients that cannot set `Authorization`.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// The account behind the request's access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Token from the `token` cookie, then `Authorization: Bearer`, then
/// `x-access-token`. Empty values are skipped.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    let from_cookie = jar.get(TOKEN_COOKIE).map(|c| c.value().trim().to_string());
    let from_bearer = || {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
    };
    let from_header = || {
        headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|t| t.trim().to_string())
    };

    from_cookie
        .filter(|t| !t.is_empty())
        .or_else(|| from_bearer().filter(|t| !t.is_empty()))
        .or_else(|| from_header().filter(|t| !t.is_empty()))
}

/// Axum middleware: verifies the access token, loads the account and
/// rejects unusable ones before the handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers())
        .ok_or_else(|| AppError::Unauthorized("Access denied. No token provided".into()))?;

    let user = authenticate_token(&state, &token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
