//! Google sign-in handlers. Every outcome is a `302 Found`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};

use crate::AppState;
use crate::models::OAuthCallbackParams;
use crate::services::cookies::token_cookie;
use crate::services::oauth::{self, LoginFailure};

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn failure(state: &AppState, reason: LoginFailure) -> Response {
    found(&state.config.login_failure_redirect(reason.code()))
}

/// `GET /user/google`: send the browser to the consent screen.
pub async fn google_login_handler(State(state): State<AppState>) -> Response {
    match oauth::begin_login(&state) {
        Ok(url) => found(&url),
        Err(reason) => failure(&state, reason),
    }
}

/// `GET /user/google/callback`: finish sign-in and hand the token to the
/// web client through both the `token` cookie and the redirect URL.
pub async fn google_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<OAuthCallbackParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "unreadable callback query");
            return failure(&state, LoginFailure::AuthFailed);
        }
    };

    match oauth::complete_login(&state, params).await {
        Ok((user, token)) => {
            info!(user_id = %user.id, "google sign-in completed");
            let cookie = token_cookie(
                &token,
                state.tokens.access_ttl().num_seconds(),
                state.config.cookie_secure,
            );
            let redirect = found(&state.config.login_success_redirect(&token));
            (jar.add(cookie), redirect).into_response()
        }
        Err(reason) => failure(&state, reason),
    }
}
