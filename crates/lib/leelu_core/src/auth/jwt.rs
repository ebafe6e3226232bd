//! JWT token issuance and verification.
//!
//! Three token classes share one signing scheme (HS256) and one
//! audience/issuer pair. The `type` claim keeps them apart: a token is
//! verified with the key of the class it claims to be, then rejected if that
//! class is not the one the caller asked for.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;

use super::AuthError;
use crate::models::auth::{
    AccessClaims, Invitation, InviteClaims, RefreshClaims, TOKEN_AUDIENCE, TOKEN_ISSUER,
    TokenClaims, TokenKind, TokenPair,
};
use crate::models::user::User;

/// Default access token lifetime: 1 hour.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;
/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Default invite token lifetime: 3 days.
pub const DEFAULT_INVITE_TTL_SECS: i64 = 3 * 24 * 60 * 60;

/// Secrets and lifetimes for the token service.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
    /// Falls back to `access_secret` when unset or empty.
    pub invite_secret: Option<String>,
    pub invite_ttl: Duration,
}

impl TokenConfig {
    /// Config with default lifetimes and no dedicated invite secret.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_secret: refresh_secret.into(),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
            invite_secret: None,
            invite_ttl: Duration::seconds(DEFAULT_INVITE_TTL_SECS),
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("invite_secret", &self.invite_secret.as_ref().map(|_| "<set>"))
            .field("invite_ttl", &self.invite_ttl)
            .finish_non_exhaustive()
    }
}

/// Parse a lifetime such as `30s`, `15m`, `1h` or `7d`. Bare digits are seconds.
pub fn parse_lifetime(value: &str) -> Result<Duration, AuthError> {
    let value = value.trim();
    let invalid = || {
        AuthError::Config(format!(
            "invalid token lifetime '{value}': expected number + d/h/m/s (e.g. 7d, 24h, 60m)"
        ))
    };
    if value.is_empty() {
        return Err(invalid());
    }
    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c),
        _ => (value, 's'),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    let seconds = match unit {
        's' => Some(amount),
        'm' => amount.checked_mul(60),
        'h' => amount.checked_mul(60 * 60),
        'd' => amount.checked_mul(24 * 60 * 60),
        _ => None,
    }
    .ok_or_else(invalid)?;
    Duration::try_seconds(seconds).ok_or_else(invalid)
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies access, refresh and invite tokens.
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    invite: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    invite_ttl: Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("invite_ttl", &self.invite_ttl)
            .finish_non_exhaustive()
    }
}

/// Only the discriminator, read before the key is chosen.
#[derive(Deserialize)]
struct KindOnly {
    #[serde(rename = "type")]
    kind: TokenKind,
}

impl TokenService {
    /// Build the service. Fails if the access or refresh secret is missing.
    pub fn new(config: TokenConfig) -> Result<Self, AuthError> {
        if config.access_secret.trim().is_empty() {
            return Err(AuthError::Config("ACCESS_TOKEN_SECRET is required".into()));
        }
        if config.refresh_secret.trim().is_empty() {
            return Err(AuthError::Config("REFRESH_TOKEN_SECRET is required".into()));
        }
        let invite_secret = config
            .invite_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&config.access_secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        Ok(Self {
            access: SigningKeys::from_secret(&config.access_secret),
            refresh: SigningKeys::from_secret(&config.refresh_secret),
            invite: SigningKeys::from_secret(invite_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            invite_ttl: config.invite_ttl,
            validation,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn invite_ttl(&self) -> Duration {
        self.invite_ttl
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::Invite => &self.invite,
        }
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.kind()).encoding,
        )
        .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Sign an access token carrying the user's id, email and role.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        self.sign(&TokenClaims::Access(AccessClaims {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            aud: TOKEN_AUDIENCE.to_string(),
            iss: TOKEN_ISSUER.to_string(),
        }))
    }

    /// Sign a refresh token carrying only the user's id.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        self.sign(&TokenClaims::Refresh(RefreshClaims {
            id: user.id.clone(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
            aud: TOKEN_AUDIENCE.to_string(),
            iss: TOKEN_ISSUER.to_string(),
        }))
    }

    /// Sign an invitation token.
    pub fn issue_invite_token(&self, invitation: &Invitation) -> Result<String, AuthError> {
        let now = Utc::now();
        self.sign(&TokenClaims::Invite(InviteClaims {
            inviter_id: invitation.inviter_id.clone(),
            organization_id: invitation.organization_id.clone(),
            email: invitation.email.clone(),
            role_id: invitation.role,
            iat: now.timestamp(),
            exp: (now + self.invite_ttl).timestamp(),
            aud: TOKEN_AUDIENCE.to_string(),
            iss: TOKEN_ISSUER.to_string(),
        }))
    }

    /// Issue an access + refresh token pair.
    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
            expires_in: self.access_ttl.num_seconds(),
            token_type: "Bearer".to_string(),
        })
    }

    /// Verify signature, audience, issuer and expiry, then require `expected` type.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError> {
        let claimed = peek_kind(token)?;
        let data = decode::<TokenClaims>(token, &self.keys(claimed).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed(e.to_string()),
            })?;
        let found = data.claims.kind();
        if found != expected {
            return Err(AuthError::TokenTypeMismatch { expected, found });
        }
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        match self.verify(token, TokenKind::Access)? {
            TokenClaims::Access(claims) => Ok(claims),
            other => Err(AuthError::TokenTypeMismatch {
                expected: TokenKind::Access,
                found: other.kind(),
            }),
        }
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        match self.verify(token, TokenKind::Refresh)? {
            TokenClaims::Refresh(claims) => Ok(claims),
            other => Err(AuthError::TokenTypeMismatch {
                expected: TokenKind::Refresh,
                found: other.kind(),
            }),
        }
    }

    pub fn verify_invite(&self, token: &str) -> Result<InviteClaims, AuthError> {
        match self.verify(token, TokenKind::Invite)? {
            TokenClaims::Invite(claims) => Ok(claims),
            other => Err(AuthError::TokenTypeMismatch {
                expected: TokenKind::Invite,
                found: other.kind(),
            }),
        }
    }
}

/// Read the unverified `type` claim to pick a verification key.
fn peek_kind(token: &str) -> Result<TokenKind, AuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::TokenMalformed("expected three segments".into())),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::TokenMalformed(format!("payload encoding: {e}")))?;
    let peek: KindOnly = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::TokenMalformed(format!("payload: {e}")))?;
    Ok(peek.kind)
}
