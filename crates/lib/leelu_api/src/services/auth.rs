//! Token-based session logic.

use leelu_core::auth::AuthError;
use leelu_core::models::auth::TokenPair;
use leelu_core::models::user::User;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Reject removed, disabled and blocked accounts.
///
/// Removal is checked first because soft deletion also clears `is_active`.
pub fn ensure_account_usable(user: &User) -> Result<(), AuthError> {
    if user.is_deleted {
        return Err(AuthError::AccountRemoved);
    }
    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }
    if user.is_blocked {
        return Err(AuthError::AccountBlocked);
    }
    Ok(())
}

/// Resolve an access token to a usable account.
pub async fn authenticate_token(state: &AppState, token: &str) -> AppResult<User> {
    let claims = state.tokens.verify_access(token).inspect_err(|e| {
        debug!(error = %e, "access token rejected");
    })?;
    let user = state
        .store
        .find_user_by_id(&claims.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    ensure_account_usable(&user)?;
    Ok(user)
}

/// Trade a refresh token for a fresh pair. Does not count as a login.
pub async fn refresh_session(state: &AppState, refresh_token: &str) -> AppResult<(User, TokenPair)> {
    let claims = state.tokens.verify_refresh(refresh_token)?;
    let user = state
        .store
        .find_user_by_id(&claims.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    ensure_account_usable(&user)?;
    let pair = state.tokens.issue_token_pair(&user)?;
    Ok((user, pair))
}
