//! User storage collaborator.
//!
//! The core never talks to a database directly; it goes through
//! [`UserStore`]. [`PgUserStore`] backs production and [`MemoryUserStore`]
//! backs tests and local development. Both enforce the same uniqueness rules
//! (email, non-null google id) and report a lost race as
//! [`AuthError::UniqueViolation`].

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::AuthError;
use crate::models::user::{AuthProvider, Role, User, UserPage, UserQuery, UserUpdate};

/// Name of the unique index on normalized email.
pub const EMAIL_UNIQUE: &str = "users_email_lower_key";
/// Name of the partial unique index on google id.
pub const GOOGLE_ID_UNIQUE: &str = "users_google_id_key";

/// Lookup predicate for a federated login: `google_id = federated_id OR
/// email = email`. A google id match wins over an email match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMatch {
    pub federated_id: String,
    /// Already normalized.
    pub email: String,
}

/// Fields written only when the upsert creates a row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub auth_provider: AuthProvider,
    pub role: Role,
    pub is_email_verified: bool,
    pub is_active: bool,
    pub is_blocked: bool,
}

/// Fields written on every upsert. Optional fields only fill gaps and never
/// replace a stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySet {
    pub last_login: DateTime<Utc>,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Includes soft-deleted users so callers can tell "removed" from "unknown".
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;

    async fn find_user_by_email_or_federated_id(
        &self,
        key: &IdentityMatch,
    ) -> Result<Option<User>, AuthError>;

    /// Atomic find-or-create. Applies `set` to the matching row, or inserts
    /// `insert` plus `set` when nothing matches.
    async fn upsert_on_insert_vs_set(
        &self,
        key: &IdentityMatch,
        insert: &NewUser,
        set: &IdentitySet,
    ) -> Result<User, AuthError>;

    /// Returns `None` when the user is unknown or soft-deleted.
    async fn update_user_fields(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, AuthError>;

    async fn touch_last_login(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError>;

    /// Soft delete. Returns `None` when the user is unknown or already removed.
    async fn mark_deleted(&self, id: &str) -> Result<Option<User>, AuthError>;

    /// Non-deleted users, newest first.
    async fn list_users(&self, query: &UserQuery) -> Result<UserPage, AuthError>;
}
