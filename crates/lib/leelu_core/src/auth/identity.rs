//! Federated identity reconciliation.
//!
//! Maps an identity-provider profile onto exactly one local user, creating it
//! on first login. Concurrent first logins for the same person converge on a
//! single row: the store's upsert is atomic and the loser of an insert race
//! re-reads the winner's row.

use chrono::Utc;
use tracing::{debug, info};

use super::AuthError;
use crate::models::user::{AuthProvider, Role, User, normalize_email};
use crate::store::{IdentityMatch, IdentitySet, NewUser, UserStore};

/// Name given to accounts whose provider profile has no usable display name.
pub const FALLBACK_DISPLAY_NAME: &str = "Google User";

const MAX_NAME_CHARS: usize = 100;

/// Identity asserted by an external provider after a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FederatedProfile {
    pub provider_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
    pub provider: AuthProvider,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Find or create the local user for `profile` and record the login.
///
/// Existing name, role and status flags are never overwritten; only the
/// last-login time is refreshed and a missing google id or picture filled in.
pub async fn reconcile_federated_identity(
    store: &dyn UserStore,
    profile: &FederatedProfile,
) -> Result<User, AuthError> {
    let email = non_blank(profile.email.as_deref())
        .map(normalize_email)
        .ok_or(AuthError::MissingEmail)?;
    let provider_id = non_blank(profile.provider_id.as_deref())
        .ok_or(AuthError::MissingIdentity)?
        .to_string();
    let name: String = non_blank(profile.display_name.as_deref())
        .unwrap_or(FALLBACK_DISPLAY_NAME)
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    let picture = non_blank(profile.picture_url.as_deref()).map(str::to_string);
    let now = Utc::now();

    let key = IdentityMatch {
        federated_id: provider_id.clone(),
        email: email.clone(),
    };
    let insert = NewUser {
        name,
        email,
        google_id: Some(provider_id.clone()),
        profile_picture: picture.clone(),
        auth_provider: profile.provider,
        role: Role::User,
        is_email_verified: true,
        is_active: true,
        is_blocked: false,
    };
    let set = IdentitySet {
        last_login: now,
        google_id: Some(provider_id),
        profile_picture: picture,
    };

    match store.upsert_on_insert_vs_set(&key, &insert, &set).await {
        Ok(user) => {
            info!(user_id = %user.id, provider = profile.provider.as_str(), "federated login");
            Ok(user)
        }
        Err(AuthError::UniqueViolation(constraint)) => {
            debug!(%constraint, email = %key.email, "lost find-or-create race, re-reading");
            let Some(existing) = store.find_user_by_email_or_federated_id(&key).await? else {
                return Err(AuthError::UniqueViolation(constraint));
            };
            let user = store
                .touch_last_login(&existing.id, now)
                .await?
                .unwrap_or(existing);
            info!(user_id = %user.id, provider = profile.provider.as_str(), "federated login after race");
            Ok(user)
        }
        Err(e) => Err(e),
    }
}
