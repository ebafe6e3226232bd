//! Session and profile handlers for the signed-in user.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use axum_extra::extract::{CookieJar, WithRejection};
use leelu_core::models::user::UserUpdate;
use leelu_core::users;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthenticatedUser, extract_token};
use crate::models::{
    ApiResponse, InviteDetailsResponse, RefreshRequest, SessionResponse, UpdateProfileRequest,
    UserResponse,
};
use crate::services::auth::{authenticate_token, refresh_session};
use crate::services::cookies::{clear_token_cookie, token_cookie};

/// `GET /user/verify`: check the caller's access token.
pub async fn verify_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let token = extract_token(&jar, &headers)
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;
    let user = authenticate_token(&state, &token).await?;
    Ok(Json(ApiResponse::ok(
        "Token verified successfully",
        UserResponse::from(&user),
    )))
}

/// `POST /user/refresh`: exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<RefreshRequest>, AppError>,
) -> AppResult<(CookieJar, Json<ApiResponse<SessionResponse>>)> {
    let (user, tokens) = refresh_session(&state, &body.refresh_token).await?;
    let cookie = token_cookie(
        &tokens.access_token,
        tokens.expires_in,
        state.config.cookie_secure,
    );
    let session = SessionResponse {
        user: UserResponse::from(&user),
        tokens,
    };
    Ok((
        jar.add(cookie),
        Json(ApiResponse::ok("Token refreshed successfully", session)),
    ))
}

/// `GET /user/invites/{token}`: decode an invitation.
pub async fn invite_details_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<InviteDetailsResponse>>> {
    let claims = state.tokens.verify_invite(&token)?;
    Ok(Json(ApiResponse::ok(
        "Invitation retrieved successfully",
        InviteDetailsResponse::from(claims),
    )))
}

/// `GET /user/profile`
pub async fn get_profile_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(
        "User profile retrieved successfully",
        UserResponse::from(&user),
    ))
}

/// `PUT /user/profile`: change name, email or picture.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let update = UserUpdate {
        name: body.name,
        email: body.email,
        profile_picture: body.profile_picture,
        ..Default::default()
    };
    let updated = users::update_profile(state.store.as_ref(), &user.id, update).await?;
    Ok(Json(ApiResponse::ok(
        "User updated successfully",
        UserResponse::from(&updated),
    )))
}

/// `POST /user/logout`: drop the token cookie. Tokens stay valid until
/// they expire.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.add(clear_token_cookie(state.config.cookie_secure));
    (jar, Json(ApiResponse::ok("Logged out successfully", ())))
}
