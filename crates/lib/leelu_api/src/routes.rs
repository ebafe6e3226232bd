//! Route paths, `METHOD_PATH` naming.

pub const GET_HEALTH: &str = "/api/v1/health";

pub const GET_USER_GOOGLE: &str = "/api/v1/user/google";
pub const GET_USER_GOOGLE_CALLBACK: &str = crate::config::GOOGLE_CALLBACK_PATH;
pub const GET_USER_VERIFY: &str = "/api/v1/user/verify";
pub const POST_USER_REFRESH: &str = "/api/v1/user/refresh";
pub const GET_USER_INVITE: &str = "/api/v1/user/invites/{token}";
/// `GET` and `PUT`.
pub const USER_PROFILE: &str = "/api/v1/user/profile";
pub const POST_USER_LOGOUT: &str = "/api/v1/user/logout";

pub const GET_ADMIN_USERS: &str = "/api/v1/admin/users";
pub const PATCH_ADMIN_USER_BLOCK: &str = "/api/v1/admin/users/{userId}/block";
pub const PATCH_ADMIN_USER_UNBLOCK: &str = "/api/v1/admin/users/{userId}/unblock";
pub const PATCH_ADMIN_USER_PROMOTE: &str = "/api/v1/admin/users/{userId}/promote";
pub const PATCH_ADMIN_USER_DEMOTE: &str = "/api/v1/admin/users/{userId}/demote";
pub const DELETE_ADMIN_USER: &str = "/api/v1/admin/users/{userId}";
pub const POST_ADMIN_INVITES: &str = "/api/v1/admin/invites";
