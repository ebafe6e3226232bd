//! Token claim models.
//!
//! Every token carries a `type` discriminator; the payload shape is fixed per
//! type so a verifier can reject a structurally wrong token at decode time.

use serde::{Deserialize, Serialize};

use super::user::Role;

/// Audience bound into every token we sign and required on verification.
pub const TOKEN_AUDIENCE: &str = "leelu-ai-api";
/// Issuer bound into every token we sign and required on verification.
pub const TOKEN_ISSUER: &str = "leelu-ai-system";

/// Token class, serialized as the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Invite,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::Invite => "invite",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims of a short-lived API access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID.
    pub id: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

/// Claims of a refresh token. Carries only the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

/// Claims of an invitation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteClaims {
    pub inviter_id: String,
    pub organization_id: Option<String>,
    /// Invitee email.
    pub email: String,
    pub role_id: Role,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

/// Decoded token payload, discriminated by the `type` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
    Invite(InviteClaims),
}

impl TokenClaims {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenClaims::Access(_) => TokenKind::Access,
            TokenClaims::Refresh(_) => TokenKind::Refresh,
            TokenClaims::Invite(_) => TokenKind::Invite,
        }
    }
}

/// Who is inviting whom, and into which role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub inviter_id: String,
    pub organization_id: Option<String>,
    pub email: String,
    pub role: Role,
}

/// Access + refresh tokens issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_claims_serialize_with_type_tag() {
        let claims = TokenClaims::Access(AccessClaims {
            id: "u1".into(),
            email: "a@b.com".into(),
            role: Role::Admin,
            iat: 1,
            exp: 2,
            aud: TOKEN_AUDIENCE.into(),
            iss: TOKEN_ISSUER.into(),
        });
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "access");
        assert_eq!(value["role"], "admin");
        assert_eq!(value["id"], "u1");
    }

    #[test]
    fn invite_claims_use_camel_case_fields() {
        let value = json!({
            "type": "invite",
            "inviterId": "u1",
            "organizationId": null,
            "email": "new@x.com",
            "roleId": "manager",
            "iat": 1,
            "exp": 2,
            "aud": TOKEN_AUDIENCE,
            "iss": TOKEN_ISSUER,
        });
        let claims: TokenClaims = serde_json::from_value(value).unwrap();
        assert_eq!(claims.kind(), TokenKind::Invite);
        match claims {
            TokenClaims::Invite(c) => {
                assert_eq!(c.inviter_id, "u1");
                assert_eq!(c.role_id, Role::Manager);
                assert!(c.organization_id.is_none());
            }
            other => panic!("unexpected claims: {other:?}"),
        }
    }

    #[test]
    fn access_payload_missing_role_is_rejected() {
        let value = json!({
            "type": "access",
            "id": "u1",
            "email": "a@b.com",
            "iat": 1,
            "exp": 2,
            "aud": TOKEN_AUDIENCE,
            "iss": TOKEN_ISSUER,
        });
        assert!(serde_json::from_value::<TokenClaims>(value).is_err());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let value = json!({ "type": "session", "id": "u1", "iat": 1, "exp": 2 });
        assert!(serde_json::from_value::<TokenClaims>(value).is_err());
    }
}
