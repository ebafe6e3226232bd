//! In-process user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{EMAIL_UNIQUE, GOOGLE_ID_UNIQUE, IdentityMatch, IdentitySet, NewUser, UserStore};
use crate::auth::AuthError;
use crate::models::user::{Pagination, User, UserPage, UserQuery, UserUpdate};

/// Users kept in insertion order behind a single lock. Every mutation runs
/// inside one write-lock section, which makes the upsert atomic.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn position_of(users: &[User], key: &IdentityMatch) -> Option<usize> {
    users
        .iter()
        .position(|u| u.google_id.as_deref() == Some(key.federated_id.as_str()))
        .or_else(|| users.iter().position(|u| u.email == key.email))
}

fn check_unique(
    users: &[User],
    skip: Option<usize>,
    email: &str,
    google_id: Option<&str>,
) -> Result<(), AuthError> {
    let others = users
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .map(|(_, u)| u);
    for other in others {
        if other.email == email {
            return Err(AuthError::UniqueViolation(EMAIL_UNIQUE.to_string()));
        }
        if google_id.is_some() && other.google_id.as_deref() == google_id {
            return Err(AuthError::UniqueViolation(GOOGLE_ID_UNIQUE.to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email_or_federated_id(
        &self,
        key: &IdentityMatch,
    ) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(position_of(&users, key).map(|i| users[i].clone()))
    }

    async fn upsert_on_insert_vs_set(
        &self,
        key: &IdentityMatch,
        insert: &NewUser,
        set: &IdentitySet,
    ) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        if let Some(i) = position_of(&users, key) {
            let google_id = users[i].google_id.clone().or_else(|| set.google_id.clone());
            check_unique(&users, Some(i), &users[i].email, google_id.as_deref())?;

            let user = &mut users[i];
            user.google_id = google_id;
            if user.profile_picture.is_none() {
                user.profile_picture = set.profile_picture.clone();
            }
            user.last_login = Some(set.last_login);
            user.updated_at = set.last_login;
            return Ok(user.clone());
        }

        let google_id = insert.google_id.clone().or_else(|| set.google_id.clone());
        check_unique(&users, None, &insert.email, google_id.as_deref())?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: insert.name.clone(),
            email: insert.email.clone(),
            google_id,
            profile_picture: insert
                .profile_picture
                .clone()
                .or_else(|| set.profile_picture.clone()),
            auth_provider: insert.auth_provider,
            role: insert.role,
            is_email_verified: insert.is_email_verified,
            is_active: insert.is_active,
            is_blocked: insert.is_blocked,
            is_deleted: false,
            last_login: Some(set.last_login),
            created_at: set.last_login,
            updated_at: set.last_login,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user_fields(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, AuthError> {
        let mut users = self.users.write().await;
        let Some(i) = users.iter().position(|u| u.id == id && !u.is_deleted) else {
            return Ok(None);
        };
        if let Some(email) = &update.email {
            check_unique(&users, Some(i), email, None)?;
        }
        update.apply_to(&mut users[i], Utc::now());
        Ok(Some(users[i].clone()))
    }

    async fn touch_last_login(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.last_login = Some(at);
            u.updated_at = at;
            u.clone()
        }))
    }

    async fn mark_deleted(&self, id: &str) -> Result<Option<User>, AuthError> {
        let mut users = self.users.write().await;
        Ok(users
            .iter_mut()
            .find(|u| u.id == id && !u.is_deleted)
            .map(|u| {
                u.is_deleted = true;
                u.is_active = false;
                u.updated_at = Utc::now();
                u.clone()
            }))
    }

    async fn list_users(&self, query: &UserQuery) -> Result<UserPage, AuthError> {
        let users = self.users.read().await;
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&User> = users
            .iter()
            .filter(|u| !u.is_deleted)
            .filter(|u| match &needle {
                Some(n) => u.name.to_lowercase().contains(n) || u.email.contains(n),
                None => true,
            })
            .collect();
        // Later inserts first when timestamps tie.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(UserPage {
            users: page,
            pagination: Pagination::new(query.page, query.limit, total),
        })
    }
}
