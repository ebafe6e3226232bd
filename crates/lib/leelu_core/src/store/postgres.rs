//! PostgreSQL user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{IdentityMatch, IdentitySet, NewUser, UserStore};
use crate::auth::AuthError;
use crate::models::user::{Pagination, User, UserPage, UserQuery, UserUpdate};

macro_rules! user_columns {
    () => {
        "id::text AS id, name, email, google_id, profile_picture, auth_provider, role, \
         is_email_verified, is_active, is_blocked, is_deleted, last_login, created_at, updated_at"
    };
}

/// Find-or-create in one statement. The target row is locked, updated and
/// returned; when there is none a row is inserted instead. Two concurrent
/// inserts for the same identity collide on a unique index and the loser
/// gets a unique violation.
const UPSERT_SQL: &str = concat!(
    "WITH target AS (\
         SELECT id FROM users \
         WHERE google_id = $1 OR lower(email) = $2 \
         ORDER BY (google_id IS NOT DISTINCT FROM $1) DESC \
         LIMIT 1 \
         FOR UPDATE\
     ), updated AS (\
         UPDATE users u SET \
             last_login = $3, \
             google_id = COALESCE(u.google_id, $4), \
             profile_picture = COALESCE(u.profile_picture, $5), \
             updated_at = $3 \
         FROM target WHERE u.id = target.id \
         RETURNING u.*\
     ), inserted AS (\
         INSERT INTO users (name, email, google_id, profile_picture, auth_provider, role, \
                            is_email_verified, is_active, is_blocked, last_login, created_at, updated_at) \
         SELECT $6, $2, COALESCE($7, $4), COALESCE($8, $5), $9, $10, $11, $12, $13, $3, $3, $3 \
         WHERE NOT EXISTS (SELECT 1 FROM target) \
         RETURNING *\
     ) ",
    "SELECT ",
    user_columns!(),
    " FROM updated UNION ALL SELECT ",
    user_columns!(),
    " FROM inserted"
);

/// Raw `users` row. Enum columns are decoded as text and validated when
/// converted into a [`User`].
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    google_id: Option<String>,
    profile_picture: Option<String>,
    auth_provider: String,
    role: String,
    is_email_verified: bool,
    is_active: bool,
    is_blocked: bool,
    is_deleted: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| AuthError::Internal(format!("user {}: {e}", row.id)))?;
        let auth_provider = row
            .auth_provider
            .parse()
            .map_err(|e| AuthError::Internal(format!("user {}: {e}", row.id)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            google_id: row.google_id,
            profile_picture: row.profile_picture,
            auth_provider,
            role,
            is_email_verified: row.is_email_verified,
            is_active: row.is_active,
            is_blocked: row.is_blocked,
            is_deleted: row.is_deleted,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, AuthError> {
    row.map(User::try_from).transpose()
}

/// Ids are UUIDs. Anything else cannot match a row, and casting it in SQL
/// would raise instead of returning nothing.
fn is_uuid(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        if !is_uuid(id) {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1::uuid"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn find_user_by_email_or_federated_id(
        &self,
        key: &IdentityMatch,
    ) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE google_id = $1 OR lower(email) = $2 \
              ORDER BY (google_id IS NOT DISTINCT FROM $1) DESC LIMIT 1"
        ))
        .bind(&key.federated_id)
        .bind(&key.email)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn upsert_on_insert_vs_set(
        &self,
        key: &IdentityMatch,
        insert: &NewUser,
        set: &IdentitySet,
    ) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(UPSERT_SQL)
            .bind(&key.federated_id)
            .bind(&key.email)
            .bind(set.last_login)
            .bind(&set.google_id)
            .bind(&set.profile_picture)
            .bind(&insert.name)
            .bind(&insert.google_id)
            .bind(&insert.profile_picture)
            .bind(insert.auth_provider.as_str())
            .bind(insert.role.as_str())
            .bind(insert.is_email_verified)
            .bind(insert.is_active)
            .bind(insert.is_blocked)
            .fetch_one(&self.pool)
            .await?;
        User::try_from(row)
    }

    async fn update_user_fields(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, AuthError> {
        if !is_uuid(id) {
            return Ok(None);
        }
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
        if let Some(name) = &update.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(email) = &update.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(picture) = &update.profile_picture {
            qb.push(", profile_picture = ").push_bind(picture);
        }
        if let Some(role) = update.role {
            qb.push(", role = ").push_bind(role.as_str());
        }
        if let Some(active) = update.is_active {
            qb.push(", is_active = ").push_bind(active);
        }
        if let Some(blocked) = update.is_blocked {
            qb.push(", is_blocked = ").push_bind(blocked);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push("::uuid AND NOT is_deleted RETURNING ")
            .push(user_columns!());

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?;
        into_user(row)
    }

    async fn touch_last_login(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        if !is_uuid(id) {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "UPDATE users SET last_login = $2, updated_at = $2 WHERE id = $1::uuid RETURNING ",
            user_columns!()
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn mark_deleted(&self, id: &str) -> Result<Option<User>, AuthError> {
        if !is_uuid(id) {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "UPDATE users SET is_deleted = TRUE, is_active = FALSE, updated_at = now() \
             WHERE id = $1::uuid AND NOT is_deleted RETURNING ",
            user_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        into_user(row)
    }

    async fn list_users(&self, query: &UserQuery) -> Result<UserPage, AuthError> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users \
              WHERE NOT is_deleted AND ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1) \
              ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(i64::from(query.limit))
        .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users \
             WHERE NOT is_deleted AND ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserPage {
            users,
            pagination: Pagination::new(query.page, query.limit, total.max(0) as u64),
        })
    }
}
