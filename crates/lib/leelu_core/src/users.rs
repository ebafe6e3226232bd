//! Account management on top of [`UserStore`].
//!
//! Field allow-lists per privilege, the self-action guard and the admin
//! actions exposed under `/admin/users`.

use tracing::info;

use crate::auth::AuthError;
use crate::auth::roles::{capability, role_can};
use crate::models::auth::Invitation;
use crate::models::user::{Role, User, UserPage, UserQuery, UserUpdate, normalize_email};
use crate::store::UserStore;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Who is asking for an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// A user editing their own profile: name, email, picture.
    SelfService,
    /// An administrator: additionally role and status flags.
    Admin,
}

/// Strip fields the privilege may not touch, then normalize and validate
/// what is left.
pub fn sanitize_update(update: UserUpdate, privilege: Privilege) -> Result<UserUpdate, AuthError> {
    let mut clean = UserUpdate {
        name: update.name.map(|n| n.trim().to_string()),
        email: update.email.map(|e| normalize_email(&e)),
        profile_picture: update.profile_picture.map(|p| p.trim().to_string()),
        ..Default::default()
    };
    if privilege == Privilege::Admin {
        clean.role = update.role;
        clean.is_active = update.is_active;
        clean.is_blocked = update.is_blocked;
    }

    if clean.is_empty() {
        return Err(AuthError::Validation("No valid fields to update".into()));
    }
    if let Some(name) = &clean.name {
        let len = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
            return Err(AuthError::Validation(format!(
                "Name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
            )));
        }
    }
    if let Some(email) = &clean.email {
        validate_email(email)?;
    }
    if let Some(picture) = &clean.profile_picture
        && !is_web_url(picture)
    {
        return Err(AuthError::Validation(
            "Profile picture must be a valid URL".into(),
        ));
    }
    Ok(clean)
}

/// Normalize `email` and reject anything that cannot be an address.
pub fn validate_email(email: &str) -> Result<String, AuthError> {
    let email = normalize_email(email);
    if !is_plausible_email(&email) {
        return Err(AuthError::Validation("Please provide a valid email".into()));
    }
    Ok(email)
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_web_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

/// Reject an action an actor may not perform on their own account.
pub fn ensure_not_self(actor_id: &str, target_id: &str, verb: &'static str) -> Result<(), AuthError> {
    if actor_id == target_id {
        return Err(AuthError::SelfAction(verb));
    }
    Ok(())
}

/// Status and role changes an administrator can make to another account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Block,
    Unblock,
    Promote,
    Demote,
}

impl AdminAction {
    pub fn verb(&self) -> &'static str {
        match self {
            AdminAction::Block => "block",
            AdminAction::Unblock => "unblock",
            AdminAction::Promote => "promote",
            AdminAction::Demote => "demote",
        }
    }

    fn update(&self) -> UserUpdate {
        match self {
            AdminAction::Block => UserUpdate {
                is_blocked: Some(true),
                ..Default::default()
            },
            AdminAction::Unblock => UserUpdate {
                is_blocked: Some(false),
                ..Default::default()
            },
            AdminAction::Promote => UserUpdate {
                role: Some(Role::Admin),
                ..Default::default()
            },
            AdminAction::Demote => UserUpdate {
                role: Some(Role::User),
                ..Default::default()
            },
        }
    }

    fn forbids_self(&self) -> bool {
        matches!(self, AdminAction::Block)
    }
}

/// Load a live target account, refusing one that outranks the actor.
async fn load_target(
    store: &dyn UserStore,
    actor: &User,
    target_id: &str,
    verb: &str,
) -> Result<User, AuthError> {
    let target = store
        .find_user_by_id(target_id)
        .await?
        .filter(|u| !u.is_deleted)
        .ok_or(AuthError::UserNotFound)?;
    if target.role.rank() > actor.role.rank() {
        return Err(AuthError::PermissionDenied(format!("{verb} {}", target.role)));
    }
    Ok(target)
}

pub async fn apply_admin_action(
    store: &dyn UserStore,
    actor: &User,
    target_id: &str,
    action: AdminAction,
) -> Result<User, AuthError> {
    if action.forbids_self() {
        ensure_not_self(&actor.id, target_id, action.verb())?;
    }
    load_target(store, actor, target_id, action.verb()).await?;
    let update = sanitize_update(action.update(), Privilege::Admin)?;
    let user = store
        .update_user_fields(target_id, &update)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    info!(actor_id = %actor.id, target_id, action = action.verb(), "admin action applied");
    Ok(user)
}

/// Soft-delete another account.
pub async fn delete_user(
    store: &dyn UserStore,
    actor: &User,
    target_id: &str,
) -> Result<User, AuthError> {
    ensure_not_self(&actor.id, target_id, "delete")?;
    load_target(store, actor, target_id, "delete").await?;
    let user = store
        .mark_deleted(target_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    info!(actor_id = %actor.id, target_id, "user deleted");
    Ok(user)
}

/// Self-service profile update.
pub async fn update_profile(
    store: &dyn UserStore,
    user_id: &str,
    update: UserUpdate,
) -> Result<User, AuthError> {
    let update = sanitize_update(update, Privilege::SelfService)?;
    match store.update_user_fields(user_id, &update).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AuthError::UserNotFound),
        Err(AuthError::UniqueViolation(_)) => {
            Err(AuthError::Validation("Email already exists".into()))
        }
        Err(e) => Err(e),
    }
}

/// Build an invitation from `actor` into `role`. Granting admin requires
/// the promote capability and granting superAdmin requires being one.
pub fn create_invitation(
    actor: &User,
    email: &str,
    role: Role,
    organization_id: Option<String>,
) -> Result<Invitation, AuthError> {
    let email = validate_email(email)?;
    let allowed = match role {
        Role::SuperAdmin => actor.role == Role::SuperAdmin,
        Role::Admin => role_can(actor.role, capability::PROMOTE_TO_ADMIN),
        _ => true,
    };
    if !allowed {
        return Err(AuthError::PermissionDenied(format!("invite as {role}")));
    }
    Ok(Invitation {
        inviter_id: actor.id.clone(),
        organization_id: organization_id.filter(|o| !o.trim().is_empty()),
        email,
        role,
    })
}

/// List users with page and limit clamped to sane bounds.
pub async fn list_users(store: &dyn UserStore, query: UserQuery) -> Result<UserPage, AuthError> {
    let query = UserQuery {
        page: query.page.max(1),
        limit: query.limit.clamp(1, MAX_PAGE_SIZE),
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };
    store.list_users(&query).await
}
