//! The httpOnly `token` cookie carrying the access token.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie read by the authentication middleware before any header.
pub const TOKEN_COOKIE: &str = "token";

/// Cookie holding an access token for `max_age_secs`.
pub fn token_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Expired cookie that makes the browser drop the token.
pub fn clear_token_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
