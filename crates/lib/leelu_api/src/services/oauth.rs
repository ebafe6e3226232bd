//! Browser sign-in through the configured identity provider.
//!
//! Both ends of the flow answer with redirects, so failures are reduced to a
//! short code the web client understands instead of an error body.

use leelu_core::auth::AuthError;
use leelu_core::auth::identity::reconcile_federated_identity;
use leelu_core::models::user::User;
use tracing::{error, info, warn};

use crate::AppState;
use crate::models::OAuthCallbackParams;
use crate::services::auth::ensure_account_usable;

/// Reason a sign-in did not complete, as reported to the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// State, code or profile unusable.
    AuthFailed,
    /// The provider refused or could not be reached.
    OAuthFailed,
    AccountDisabled,
    ServerError,
}

impl LoginFailure {
    pub fn code(&self) -> &'static str {
        match self {
            LoginFailure::AuthFailed => "auth_failed",
            LoginFailure::OAuthFailed => "oauth_failed",
            LoginFailure::AccountDisabled => "account_disabled",
            LoginFailure::ServerError => "server_error",
        }
    }
}

/// Provider consent URL for a new sign-in attempt.
pub fn begin_login(state: &AppState) -> Result<String, LoginFailure> {
    let Some(provider) = state.identity_provider.as_ref() else {
        warn!("sign-in requested but no identity provider is configured");
        return Err(LoginFailure::OAuthFailed);
    };
    let (oauth_state, challenge) = state.oauth_state.begin();
    provider
        .authorization_url(&oauth_state, &challenge)
        .map_err(|e| {
            error!(error = %e, "could not build authorization url");
            LoginFailure::ServerError
        })
}

/// Finish a sign-in: check state, redeem the code, reconcile the profile
/// and sign an access token.
pub async fn complete_login(
    state: &AppState,
    params: OAuthCallbackParams,
) -> Result<(User, String), LoginFailure> {
    if let Some(reason) = params.error {
        info!(%reason, "provider reported a failed sign-in");
        return Err(LoginFailure::OAuthFailed);
    }
    let Some(provider) = state.identity_provider.as_ref() else {
        return Err(LoginFailure::OAuthFailed);
    };
    let pending = params
        .state
        .as_deref()
        .and_then(|s| state.oauth_state.take(s))
        .ok_or_else(|| {
            warn!("callback with unknown or expired state");
            LoginFailure::AuthFailed
        })?;
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(LoginFailure::AuthFailed)?;

    let profile = provider
        .fetch_profile(&code, &pending.pkce_verifier)
        .await
        .map_err(|e| {
            warn!(error = %e, "provider exchange failed");
            LoginFailure::OAuthFailed
        })?;

    let user = reconcile_federated_identity(state.store.as_ref(), &profile)
        .await
        .map_err(|e| match e {
            AuthError::MissingEmail | AuthError::MissingIdentity => {
                warn!(error = %e, "provider profile is incomplete");
                LoginFailure::AuthFailed
            }
            other => {
                error!(error = %other, "identity reconciliation failed");
                LoginFailure::ServerError
            }
        })?;

    if let Err(e) = ensure_account_usable(&user) {
        info!(user_id = %user.id, reason = %e, "sign-in refused");
        return Err(LoginFailure::AccountDisabled);
    }

    let token = state.tokens.issue_access_token(&user).map_err(|e| {
        error!(error = %e, "could not sign access token");
        LoginFailure::ServerError
    })?;
    Ok((user, token))
}
