//! Account administration handlers.
//!
//! Capability checks happen in the router; these handlers only apply the
//! change on behalf of the authenticated administrator.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use leelu_core::models::user::User;
use leelu_core::users::{self, AdminAction};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ApiResponse, BlockStatusResponse, InviteRequest, InviteResponse, ListUsersParams,
    RoleResponse, UserListResponse,
};

/// `GET /admin/users?page&limit&search`
pub async fn list_users_handler(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<ListUsersParams>, AppError>,
) -> AppResult<Json<ApiResponse<UserListResponse>>> {
    let page = users::list_users(state.store.as_ref(), params.into()).await?;
    Ok(Json(ApiResponse::ok(
        "Users retrieved successfully",
        UserListResponse::from(page),
    )))
}

async fn apply(
    state: &AppState,
    actor: &User,
    target_id: &str,
    action: AdminAction,
) -> AppResult<User> {
    Ok(users::apply_admin_action(state.store.as_ref(), actor, target_id, action).await?)
}

/// `PATCH /admin/users/{userId}/block`
pub async fn block_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<BlockStatusResponse>>> {
    let user = apply(&state, &actor, &user_id, AdminAction::Block).await?;
    Ok(Json(ApiResponse::ok(
        "User blocked successfully",
        BlockStatusResponse {
            id: user.id,
            is_blocked: user.is_blocked,
        },
    )))
}

/// `PATCH /admin/users/{userId}/unblock`
pub async fn unblock_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<BlockStatusResponse>>> {
    let user = apply(&state, &actor, &user_id, AdminAction::Unblock).await?;
    Ok(Json(ApiResponse::ok(
        "User unblocked successfully",
        BlockStatusResponse {
            id: user.id,
            is_blocked: user.is_blocked,
        },
    )))
}

/// `PATCH /admin/users/{userId}/promote`
pub async fn promote_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<RoleResponse>>> {
    let user = apply(&state, &actor, &user_id, AdminAction::Promote).await?;
    Ok(Json(ApiResponse::ok(
        "User promoted to admin successfully",
        RoleResponse {
            id: user.id,
            role: user.role,
        },
    )))
}

/// `PATCH /admin/users/{userId}/demote`
pub async fn demote_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<RoleResponse>>> {
    let user = apply(&state, &actor, &user_id, AdminAction::Demote).await?;
    Ok(Json(ApiResponse::ok(
        "Admin privileges removed successfully",
        RoleResponse {
            id: user.id,
            role: user.role,
        },
    )))
}

/// `DELETE /admin/users/{userId}`: soft delete.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    users::delete_user(state.store.as_ref(), &actor, &user_id).await?;
    Ok(Json(ApiResponse::ok("User deleted successfully", ())))
}

/// `POST /admin/invites`: sign an invitation token.
pub async fn invite_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    WithRejection(Json(body), _): WithRejection<Json<InviteRequest>, AppError>,
) -> AppResult<Json<ApiResponse<InviteResponse>>> {
    let invitation =
        users::create_invitation(&actor, &body.email, body.role_id, body.organization_id)?;
    let token = state.tokens.issue_invite_token(&invitation)?;
    Ok(Json(ApiResponse::ok(
        "Invitation created successfully",
        InviteResponse {
            token,
            email: invitation.email,
            role_id: invitation.role,
            expires_in: state.tokens.invite_ttl().num_seconds(),
        },
    )))
}
