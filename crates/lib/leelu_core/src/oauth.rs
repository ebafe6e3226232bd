//! OAuth 2.0 authorization-code flow against an external identity provider.
//!
//! The API starts a login by minting a CSRF `state` and a PKCE verifier,
//! parks the verifier in [`OAuthStateStore`] and redirects to the provider.
//! The callback takes the state back out (single use, 10 minute TTL) and
//! hands the code and verifier to an [`IdentityProvider`], which returns the
//! asserted [`FederatedProfile`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::identity::FederatedProfile;
use crate::models::user::AuthProvider;

/// Lifetime of a pending authorization.
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// Pending authorizations kept at once before the oldest is evicted.
pub const MAX_PENDING_STATES: usize = 10_000;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth client is not configured: {0}")]
    NotConfigured(String),

    #[error("Unknown or expired OAuth state")]
    InvalidState,

    #[error("Provider returned an error: {0}")]
    Provider(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Profile fetch failed: {0}")]
    Profile(String),
}

// PKCE (RFC 7636)

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// 43 URL-safe characters.
pub fn generate_code_verifier() -> String {
    random_token(32)
}

/// S256 challenge for `verifier`.
pub fn compute_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Opaque CSRF token carried through the provider round trip.
pub fn generate_state() -> String {
    random_token(24)
}

/// Data parked between the redirect and the callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub pkce_verifier: String,
    pub created_at: Instant,
}

impl PendingAuthorization {
    pub fn new(pkce_verifier: String) -> Self {
        Self {
            pkce_verifier,
            created_at: Instant::now(),
        }
    }
}

/// Pending authorizations keyed by `state`.
#[derive(Debug)]
pub struct OAuthStateStore {
    states: DashMap<String, PendingAuthorization>,
    ttl: Duration,
    capacity: usize,
}

impl OAuthStateStore {
    pub fn new() -> Self {
        Self::with_ttl(STATE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_limits(ttl, MAX_PENDING_STATES)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            states: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Mint a state and verifier, remember the verifier, and return
    /// `(state, code_challenge)` for the authorization URL.
    pub fn begin(&self) -> (String, String) {
        let state = generate_state();
        let verifier = generate_code_verifier();
        let challenge = compute_code_challenge(&verifier);
        self.insert(state.clone(), PendingAuthorization::new(verifier));
        (state, challenge)
    }

    /// Park `pending` under `state`. At capacity, expired entries go first
    /// and then the oldest one.
    pub fn insert(&self, state: String, pending: PendingAuthorization) {
        if self.states.len() >= self.capacity {
            self.cleanup();
        }
        if self.states.len() >= self.capacity {
            let oldest = self
                .states
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                warn!(capacity = self.capacity, "pending OAuth states full, evicting the oldest");
                self.states.remove(&key);
            }
        }
        self.states.insert(state, pending);
    }

    /// Remove and return the entry. Expired entries are dropped and `None`
    /// is returned.
    pub fn take(&self, state: &str) -> Option<PendingAuthorization> {
        let (_, pending) = self.states.remove(state)?;
        if pending.created_at.elapsed() > self.ttl {
            debug!("discarding expired OAuth state");
            return None;
        }
        Some(pending)
    }

    pub fn cleanup(&self) {
        self.states.retain(|_, p| p.created_at.elapsed() <= self.ttl);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Evict expired entries once a minute for the life of the process.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                store.cleanup();
            }
        })
    }
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// An external provider that authenticates users for us.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> AuthProvider;

    /// Consent-screen URL carrying `state` and the S256 `code_challenge`.
    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String, OAuthError>;

    /// Redeem `code` and return the profile the provider asserts.
    async fn fetch_profile(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<FederatedProfile, OAuthError>;
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            userinfo_url: GOOGLE_USERINFO_URL.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo document.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

impl From<GoogleUserInfo> for FederatedProfile {
    fn from(info: GoogleUserInfo) -> Self {
        let display_name = info.name.filter(|n| !n.trim().is_empty()).or_else(|| {
            let joined = [info.given_name, info.family_name]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            Some(joined).filter(|n| !n.trim().is_empty())
        });
        FederatedProfile {
            provider_id: Some(info.sub).filter(|s| !s.is_empty()),
            email: info.email,
            display_name,
            picture_url: info.picture,
            provider: AuthProvider::Google,
        }
    }
}

pub struct GoogleProvider {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(OAuthError::NotConfigured(
                "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET are required".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| OAuthError::NotConfigured(e.to_string()))?;
        Ok(Self { config, http })
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        let resp = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "Google token endpoint rejected the code");
            return Err(OAuthError::TokenExchange(format!("HTTP {status}: {body}")));
        }

        resp.json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::TokenExchange(format!("unreadable response: {e}")))
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let resp = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%status, "Google userinfo request failed");
            return Err(OAuthError::Profile(format!("HTTP {status}")));
        }

        resp.json::<GoogleUserInfo>()
            .await
            .map_err(|e| OAuthError::Profile(format!("unreadable response: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Google
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String, OAuthError> {
        let url = url::Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| OAuthError::NotConfigured(format!("invalid auth url: {e}")))?;
        Ok(url.into())
    }

    async fn fetch_profile(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<FederatedProfile, OAuthError> {
        let tokens = self.exchange_authorization_code(code, code_verifier).await?;
        let info = self.fetch_userinfo(&tokens.access_token).await?;
        if info.email_verified == Some(false) {
            debug!(sub = %info.sub, "provider reports an unverified email");
        }
        Ok(info.into())
    }
}
