//! # leelu_api
//!
//! HTTP API for Leelu accounts: Google sign-in, session tokens, profiles
//! and administration.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::handler::Handler;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use leelu_core::auth::AuthError;
use leelu_core::auth::jwt::TokenService;
use leelu_core::auth::roles::capability;
use leelu_core::oauth::{IdentityProvider, OAuthStateStore};
use leelu_core::store::UserStore;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{admin, health, oauth, user};
use crate::middleware::auth::{ACCESS_TOKEN_HEADER, require_auth};
use crate::middleware::rbac::{Required, authorize};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn UserStore>,
    pub tokens: Arc<TokenService>,
    /// `None` when Google credentials are not configured.
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
    /// Pending sign-ins keyed by their `state` parameter.
    pub oauth_state: Arc<OAuthStateStore>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn UserStore>,
        identity_provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Result<Self, AuthError> {
        let tokens = TokenService::new(config.tokens.clone())?;
        Ok(Self {
            config,
            store,
            tokens: Arc::new(tokens),
            identity_provider,
            oauth_state: Arc::new(OAuthStateStore::new()),
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::GET_USER_GOOGLE, get(oauth::google_login_handler))
        .route(
            routes::GET_USER_GOOGLE_CALLBACK,
            get(oauth::google_callback_handler),
        )
        .route(routes::GET_USER_VERIFY, get(user::verify_handler))
        .route(routes::POST_USER_REFRESH, post(user::refresh_handler))
        .route(routes::GET_USER_INVITE, get(user::invite_details_handler));

    let gate = |caps: &'static [&'static str]| from_fn_with_state(Required(caps), authorize);

    let profile = Router::new()
        .route(
            routes::USER_PROFILE,
            get(user::get_profile_handler.layer(gate(&[capability::VIEW_PROFILE])))
                .put(user::update_profile_handler.layer(gate(&[capability::UPDATE_PROFILE]))),
        )
        .route(routes::POST_USER_LOGOUT, post(user::logout_handler))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route(routes::GET_ADMIN_USERS, get(admin::list_users_handler))
        .route(
            routes::PATCH_ADMIN_USER_BLOCK,
            patch(admin::block_user_handler.layer(gate(&[capability::BLOCK_USER]))),
        )
        .route(
            routes::PATCH_ADMIN_USER_UNBLOCK,
            patch(admin::unblock_user_handler.layer(gate(&[capability::UNBLOCK_USER]))),
        )
        .route(
            routes::PATCH_ADMIN_USER_PROMOTE,
            patch(admin::promote_user_handler.layer(gate(&[capability::PROMOTE_TO_ADMIN]))),
        )
        .route(
            routes::PATCH_ADMIN_USER_DEMOTE,
            patch(admin::demote_user_handler.layer(gate(&[capability::REMOVE_ADMIN]))),
        )
        .route(
            routes::DELETE_ADMIN_USER,
            delete(admin::delete_user_handler.layer(gate(&[capability::DELETE_USER]))),
        )
        .route(
            routes::POST_ADMIN_INVITES,
            post(admin::invite_user_handler.layer(gate(&[capability::INVITE_USER]))),
        )
        // Every admin route needs the listing capability on top of its own.
        .route_layer(gate(&[capability::VIEW_ALL_USERS]))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(public)
        .merge(profile)
        .merge(admin)
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the configured web origins and browser extensions.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            allowed.contains(origin) || origin.as_bytes().starts_with(b"chrome-extension://")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(ACCESS_TOKEN_HEADER),
        ])
        .allow_credentials(true)
}
