//! Integration tests: drive the full router over the in-memory store and a
//! stub identity provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use leelu_api::{AppState, config::ApiConfig};
use leelu_core::auth::identity::{FederatedProfile, reconcile_federated_identity};
use leelu_core::auth::jwt::TokenService;
use leelu_core::models::user::{AuthProvider, Role, User, UserUpdate};
use leelu_core::oauth::{IdentityProvider, OAuthError};
use leelu_core::store::{MemoryUserStore, UserStore};
use serde_json::{Value, json};
use tower::ServiceExt;

const FRONTEND: &str = "http://localhost:5173";
const CONSENT_URL: &str = "https://accounts.example.test/consent";

/// Accepts any code except `bad`; the code doubles as the user's handle.
struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Google
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String, OAuthError> {
        Ok(format!(
            "{CONSENT_URL}?state={state}&code_challenge={code_challenge}"
        ))
    }

    async fn fetch_profile(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<FederatedProfile, OAuthError> {
        if code == "bad" {
            return Err(OAuthError::TokenExchange("invalid_grant".into()));
        }
        Ok(profile(code))
    }
}

fn profile(handle: &str) -> FederatedProfile {
    FederatedProfile {
        provider_id: Some(format!("gid-{handle}")),
        email: Some(format!("{handle}@example.com")),
        display_name: Some(handle.to_string()),
        picture_url: None,
        provider: AuthProvider::Google,
    }
}

fn config() -> ApiConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("ACCESS_TOKEN_SECRET", "integration-access-secret-0123456789"),
        ("REFRESH_TOKEN_SECRET", "integration-refresh-secret-0123456789"),
        ("FRONTEND_URL", FRONTEND),
    ]);
    ApiConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("config")
}

struct Harness {
    state: AppState,
    store: Arc<MemoryUserStore>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let provider: Arc<dyn IdentityProvider> = Arc::new(StubProvider);
        let state = AppState::new(config(), store.clone(), Some(provider)).expect("state");
        Self { state, store }
    }

    /// Sign `handle` in through reconciliation and give them `role`.
    async fn seed(&self, handle: &str, role: Role) -> User {
        let user = reconcile_federated_identity(self.store.as_ref(), &profile(handle))
            .await
            .expect("reconcile");
        if role == Role::User {
            return user;
        }
        let update = UserUpdate {
            role: Some(role),
            ..Default::default()
        };
        self.store
            .update_user_fields(&user.id, &update)
            .await
            .expect("update")
            .expect("user exists")
    }

    fn token(&self, user: &User) -> String {
        self.state.tokens.issue_access_token(user).expect("sign")
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = leelu_api::router(self.state.clone())
            .oneshot(req)
            .await
            .expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("parse JSON")
        };
        (status, headers, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json");
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_default();
        self.send(req.body(body).unwrap()).await
    }
}

fn location(headers: &HeaderMap) -> String {
    headers
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn query_param(link: &str, key: &str) -> Option<String> {
    url::Url::parse(link)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

async fn start_login(h: &Harness) -> String {
    let (status, headers, _) = h.get("/api/v1/user/google", None).await;
    assert_eq!(status, StatusCode::FOUND);
    let consent = location(&headers);
    assert!(consent.starts_with(CONSENT_URL), "unexpected redirect {consent}");
    assert!(query_param(&consent, "code_challenge").is_some());
    query_param(&consent, "state").expect("state param")
}

async fn callback(h: &Harness, query: &str) -> String {
    let (status, headers, body) = h
        .get(&format!("/api/v1/user/google/callback?{query}"), None)
        .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(body, Value::Null, "callback must never answer with JSON");
    location(&headers)
}

// --- misc ---

#[tokio::test]
async fn health_reports_ok() {
    let h = Harness::new();
    let (status, _, body) = h.get("/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], leelu_core::version());
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let h = Harness::new();
    let (status, _, body) = h.get("/api/v1/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}

// --- google sign-in ---

#[tokio::test]
async fn sign_in_round_trip_issues_a_usable_token() {
    let h = Harness::new();
    let state = start_login(&h).await;

    let (status, headers, _) = h
        .get(
            &format!("/api/v1/user/google/callback?code=alice&state={state}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FOUND);
    let landing = location(&headers);
    assert!(landing.starts_with(&format!("{FRONTEND}/auth/callback?token=")));
    let cookie = headers
        .get(header::SET_COOKIE)
        .expect("token cookie")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let token = query_param(&landing, "token").expect("token param");
    let (status, _, body) = h.get("/api/v1/user/verify", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token verified successfully");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["isEmailVerified"], true);
}

#[tokio::test]
async fn state_cannot_be_replayed() {
    let h = Harness::new();
    let state = start_login(&h).await;

    let first = callback(&h, &format!("code=alice&state={state}")).await;
    assert!(first.contains("token="));
    let replay = callback(&h, &format!("code=alice&state={state}")).await;
    assert_eq!(replay, format!("{FRONTEND}/auth?error=auth_failed"));
}

#[tokio::test]
async fn callback_failures_redirect_with_a_code() {
    let h = Harness::new();

    let unknown = callback(&h, "code=alice&state=never-issued").await;
    assert_eq!(unknown, format!("{FRONTEND}/auth?error=auth_failed"));

    let declined = callback(&h, "error=access_denied").await;
    assert_eq!(declined, format!("{FRONTEND}/auth?error=oauth_failed"));

    let state = start_login(&h).await;
    let rejected = callback(&h, &format!("code=bad&state={state}")).await;
    assert_eq!(rejected, format!("{FRONTEND}/auth?error=oauth_failed"));

    let carol = h.seed("carol", Role::User).await;
    let block = UserUpdate {
        is_blocked: Some(true),
        ..Default::default()
    };
    h.store.update_user_fields(&carol.id, &block).await.unwrap();
    let state = start_login(&h).await;
    let blocked = callback(&h, &format!("code=carol&state={state}")).await;
    assert_eq!(blocked, format!("{FRONTEND}/auth?error=account_disabled"));
}

#[tokio::test]
async fn sign_in_without_a_provider_redirects_with_oauth_failed() {
    let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    let state = AppState::new(config(), store, None).expect("state");
    let resp = leelu_api::router(state)
        .oneshot(
            Request::builder()
                .uri("/api/v1/user/google")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(resp.headers()),
        format!("{FRONTEND}/auth?error=oauth_failed")
    );
}

// --- authentication ---

#[tokio::test]
async fn token_is_read_from_cookie_bearer_or_custom_header() {
    let h = Harness::new();
    let user = h.seed("dana", Role::User).await;
    let token = h.token(&user);

    let via_cookie = Request::builder()
        .uri("/api/v1/user/profile")
        .header(header::COOKIE, format!("token={token}"))
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = h.send(via_cookie).await;
    assert_eq!(status, StatusCode::OK, "cookie wins over the bearer header");

    let via_header = Request::builder()
        .uri("/api/v1/user/profile")
        .header("x-access-token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = h.send(via_header).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User profile retrieved successfully");

    let (status, _, _) = h.get("/api/v1/user/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_401() {
    let h = Harness::new();
    let user = h.seed("erin", Role::User).await;

    let (status, _, body) = h.get("/api/v1/user/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access denied. No token provided");

    let (status, _, body) = h.get("/api/v1/user/verify", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let mut expired_cfg = config().tokens;
    expired_cfg.access_ttl = chrono::Duration::seconds(-30);
    let expired = TokenService::new(expired_cfg)
        .unwrap()
        .issue_access_token(&user)
        .unwrap();
    let (status, _, body) = h.get("/api/v1/user/profile", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");

    let refresh = h.state.tokens.issue_refresh_token(&user).unwrap();
    let (status, _, body) = h.get("/api/v1/user/profile", Some(&refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn blocked_is_403_and_removed_is_401() {
    let h = Harness::new();
    let admin = h.seed("root", Role::Admin).await;
    let frank = h.seed("frank", Role::User).await;
    let gina = h.seed("gina", Role::User).await;
    let admin_token = h.token(&admin);

    let (status, _, _) = h
        .call(
            "PATCH",
            &format!("/api/v1/admin/users/{}/block", frank.id),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = h.get("/api/v1/user/profile", Some(&h.token(&frank))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Account is blocked");

    let (status, _, _) = h
        .call(
            "DELETE",
            &format!("/api/v1/admin/users/{}", gina.id),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = h.get("/api/v1/user/profile", Some(&h.token(&gina))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User account has been removed");
}

#[tokio::test]
async fn inactive_account_is_403_and_unknown_account_is_401() {
    let h = Harness::new();
    let quinn = h.seed("quinn", Role::User).await;
    let deactivate = UserUpdate {
        is_active: Some(false),
        ..Default::default()
    };
    h.store
        .update_user_fields(&quinn.id, &deactivate)
        .await
        .unwrap();
    let (status, _, body) = h.get("/api/v1/user/profile", Some(&h.token(&quinn))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Account is disabled");

    // Signed with the same secrets, but the account only exists elsewhere.
    let elsewhere = Harness::new();
    let ghost = elsewhere.seed("ghost", Role::User).await;
    let (status, _, body) = h
        .get("/api/v1/user/profile", Some(&elsewhere.token(&ghost)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");

    let (status, _, body) = h.get("/api/v1/user/verify", Some(&elsewhere.token(&ghost))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn refresh_returns_a_new_pair() {
    let h = Harness::new();
    let user = h.seed("hana", Role::User).await;
    let refresh = h.state.tokens.issue_refresh_token(&user).unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/user/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "refreshToken": refresh }).to_string()))
        .unwrap();
    let (status, _, body) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], user.id.as_str());
    assert_eq!(body["data"]["tokens"]["tokenType"], "Bearer");
    let access = body["data"]["tokens"]["accessToken"].as_str().unwrap();
    assert!(h.state.tokens.verify_access(access).is_ok());

    let access_as_refresh = Request::builder()
        .method("POST")
        .uri("/api/v1/user/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "refreshToken": access }).to_string()))
        .unwrap();
    let (status, _, _) = h.send(access_as_refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let h = Harness::new();
    let user = h.seed("ivan", Role::User).await;
    let (status, headers, body) = h
        .call("POST", "/api/v1/user/logout", &h.token(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
    assert_eq!(body["data"], Value::Null);
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// --- profile ---

#[tokio::test]
async fn profile_update_validates_and_ignores_privileged_fields() {
    let h = Harness::new();
    let user = h.seed("jane", Role::User).await;
    h.seed("kim", Role::User).await;
    let token = h.token(&user);
    let uri = "/api/v1/user/profile";

    let (status, _, body) = h
        .call("PUT", uri, &token, Some(json!({ "name": "J" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name must be between 2 and 50 characters");

    let (status, _, body) = h
        .call("PUT", uri, &token, Some(json!({ "role": "admin", "isBlocked": true })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No valid fields to update");

    let (status, _, body) = h
        .call("PUT", uri, &token, Some(json!({ "email": "KIM@example.com" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");

    let (status, _, body) = h
        .call(
            "PUT",
            uri,
            &token,
            Some(json!({ "name": "  Jane Doe ", "role": "superAdmin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["data"]["name"], "Jane Doe");
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let h = Harness::new();
    let user = h.seed("lee", Role::User).await;
    let req = Request::builder()
        .method("PUT")
        .uri("/api/v1/user/profile")
        .header(header::AUTHORIZATION, format!("Bearer {}", h.token(&user)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, _, body) = h.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].is_string());
}

// --- administration ---

#[tokio::test]
async fn admin_routes_require_capabilities() {
    let h = Harness::new();
    let user = h.seed("mia", Role::User).await;
    let doctor = h.seed("doc", Role::Doctor).await;

    for token in [h.token(&user), h.token(&doctor)] {
        let (status, _, body) = h.get("/api/v1/admin/users", Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Insufficient permissions");
    }

    let (status, _, _) = h.get("/api/v1/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_lists_and_searches_users() {
    let h = Harness::new();
    let admin = h.seed("root", Role::Admin).await;
    h.seed("nora", Role::User).await;
    h.seed("otto", Role::User).await;
    let token = h.token(&admin);

    let (status, _, body) = h.get("/api/v1/admin/users?page=1&limit=2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Users retrieved successfully");
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["pagination"]["total"], 3);

    let (status, _, body) = h.get("/api/v1/admin/users?search=NOR", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "nora@example.com");

    let (status, _, _) = h.get("/api/v1/admin/users?page=abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_cannot_act_on_a_super_admin() {
    let h = Harness::new();
    let admin = h.seed("root", Role::Admin).await;
    let boss = h.seed("boss", Role::SuperAdmin).await;
    let token = h.token(&admin);
    let base = format!("/api/v1/admin/users/{}", boss.id);

    for action in ["demote", "block"] {
        let (status, _, body) = h
            .call("PATCH", &format!("{base}/{action}"), &token, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{action}");
        assert_eq!(body["message"], "Insufficient permissions");
    }
    let (status, _, _) = h.call("DELETE", &base, &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = h.store.find_user_by_id(&boss.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::SuperAdmin);
    assert!(!stored.is_blocked);
    assert!(!stored.is_deleted);

    let (status, _, body) = h
        .call(
            "PATCH",
            &format!("/api/v1/admin/users/{}/demote", admin.id),
            &h.token(&boss),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn admin_cannot_block_or_delete_themselves() {
    let h = Harness::new();
    let admin = h.seed("root", Role::Admin).await;
    let token = h.token(&admin);

    let (status, _, body) = h
        .call(
            "PATCH",
            &format!("/api/v1/admin/users/{}/block", admin.id),
            &token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot block yourself");

    let (status, _, body) = h
        .call("DELETE", &format!("/api/v1/admin/users/{}", admin.id), &token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete yourself");
}

#[tokio::test]
async fn admin_actions_change_the_target() {
    let h = Harness::new();
    let admin = h.seed("root", Role::Admin).await;
    let pat = h.seed("pat", Role::User).await;
    let token = h.token(&admin);
    let base = format!("/api/v1/admin/users/{}", pat.id);

    let (status, _, body) = h.call("PATCH", &format!("{base}/block"), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User blocked successfully");
    assert_eq!(body["data"]["isBlocked"], true);

    let (_, _, body) = h.call("PATCH", &format!("{base}/unblock"), &token, None).await;
    assert_eq!(body["data"]["isBlocked"], false);

    let (_, _, body) = h.call("PATCH", &format!("{base}/promote"), &token, None).await;
    assert_eq!(body["message"], "User promoted to admin successfully");
    assert_eq!(body["data"]["role"], "admin");

    let (_, _, body) = h.call("PATCH", &format!("{base}/demote"), &token, None).await;
    assert_eq!(body["message"], "Admin privileges removed successfully");
    assert_eq!(body["data"]["role"], "user");

    let (status, _, body) = h
        .call("PATCH", "/api/v1/admin/users/missing/block", &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn invitations_can_be_created_and_read_back() {
    let h = Harness::new();
    let admin = h.seed("root", Role::Admin).await;
    let token = h.token(&admin);

    let (status, _, body) = h
        .call(
            "POST",
            "/api/v1/admin/invites",
            &token,
            Some(json!({ "email": " New.Doc@Example.com ", "roleId": "doctor", "organizationId": "org-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "new.doc@example.com");
    assert_eq!(body["data"]["expiresIn"], 3 * 24 * 60 * 60);
    let invite = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _, body) = h
        .get(&format!("/api/v1/user/invites/{invite}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inviterId"], admin.id.as_str());
    assert_eq!(body["data"]["organizationId"], "org-1");
    assert_eq!(body["data"]["roleId"], "doctor");

    let (status, _, _) = h
        .call(
            "POST",
            "/api/v1/admin/invites",
            &token,
            Some(json!({ "email": "boss@example.com", "roleId": "superAdmin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = h
        .call(
            "POST",
            "/api/v1/admin/invites",
            &token,
            Some(json!({ "email": "x@example.com", "roleId": "janitor" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let access = h.token(&admin);
    let (status, _, _) = h
        .get(&format!("/api/v1/user/invites/{access}"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
