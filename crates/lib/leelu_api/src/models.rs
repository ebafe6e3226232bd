//! Request and response bodies.

use chrono::{DateTime, Utc};
use leelu_core::models::auth::{InviteClaims, TokenPair};
use leelu_core::models::user::{AuthProvider, Pagination, Role, User, UserPage, UserQuery};
use serde::{Deserialize, Serialize};

/// Success envelope: `{ success: true, message, data }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Failure envelope: `{ success: false, error, message, details? }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub auth_provider: AuthProvider,
    pub is_email_verified: bool,
    pub is_active: bool,
    pub is_blocked: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar(),
            role: user.role,
            auth_provider: user.auth_provider,
            is_email_verified: user.is_email_verified,
            is_active: user.is_active,
            is_blocked: user.is_blocked,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

impl From<UserPage> for UserListResponse {
    fn from(page: UserPage) -> Self {
        Self {
            users: page.users.iter().map(UserResponse::from).collect(),
            pagination: page.pagination,
        }
    }
}

/// `PUT /user/profile`. Unknown fields, including `role`, are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair plus the account it was issued for.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl From<ListUsersParams> for UserQuery {
    fn from(params: ListUsersParams) -> Self {
        let defaults = UserQuery::default();
        Self {
            page: params.page.unwrap_or(defaults.page),
            limit: params.limit.unwrap_or(defaults.limit),
            search: params.search,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatusResponse {
    pub id: String,
    pub is_blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub email: String,
    pub role_id: Role,
    pub organization_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub token: String,
    pub email: String,
    pub role_id: Role,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteDetailsResponse {
    pub inviter_id: String,
    pub organization_id: Option<String>,
    pub email: String,
    pub role_id: Role,
    pub expires_at: i64,
}

impl From<InviteClaims> for InviteDetailsResponse {
    fn from(claims: InviteClaims) -> Self {
        Self {
            inviter_id: claims.inviter_id,
            organization_id: claims.organization_id,
            email: claims.email,
            role_id: claims.role_id,
            expires_at: claims.exp,
        }
    }
}

/// Query of the Google callback. Google sends `error` instead of `code` when
/// the user declines consent.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
