//! User account domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Base URL of the generated-initials avatar service.
const AVATAR_SERVICE_URL: &str = "https://ui-avatars.com/api/";

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Doctor,
    Manager,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::User,
        Role::Admin,
        Role::Doctor,
        Role::Manager,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Manager => "manager",
            Role::SuperAdmin => "superAdmin",
        }
    }

    /// Standing for account administration: superAdmin, then admin, then
    /// every other role.
    pub fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 2,
            Role::Admin => 1,
            Role::User | Role::Doctor | Role::Manager => 0,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AuthError::Validation(format!("unknown role '{s}'")))
    }
}

/// Where an account's identity was asserted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Google,
    Facebook,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Facebook => "facebook",
        }
    }
}

impl FromStr for AuthProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(AuthProvider::Google),
            "facebook" => Ok(AuthProvider::Facebook),
            other => Err(AuthError::Validation(format!(
                "unknown auth provider '{other}'"
            ))),
        }
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Always stored lowercase and trimmed.
    pub email: String,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub auth_provider: AuthProvider,
    pub role: Role,
    pub is_email_verified: bool,
    pub is_active: bool,
    pub is_blocked: bool,
    pub is_deleted: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Profile picture, or a generated initials avatar when none is stored.
    pub fn avatar(&self) -> String {
        if let Some(picture) = self.profile_picture.as_deref().filter(|p| !p.is_empty()) {
            return picture.to_string();
        }
        url::Url::parse_with_params(
            AVATAR_SERVICE_URL,
            &[
                ("name", self.name.as_str()),
                ("background", "0D8ABC"),
                ("color", "fff"),
            ],
        )
        .map(String::from)
        .unwrap_or_else(|_| AVATAR_SERVICE_URL.to_string())
    }
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Field changes to apply to a user. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_blocked: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.profile_picture.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.is_blocked.is_none()
    }

    /// Apply the present fields to `user`, bumping `updated_at`.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(picture) = &self.profile_picture {
            user.profile_picture = Some(picture.clone());
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(blocked) = self.is_blocked {
            user.is_blocked = blocked;
        }
        user.updated_at = now;
    }
}

/// Page/limit/search parameters for listing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring matched against name or email.
    pub search: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
        }
    }
}

impl UserQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// One page of users, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}
