//! API server configuration.

use leelu_core::auth::jwt::{TokenConfig, parse_lifetime};
use thiserror::Error;
use tracing::warn;

/// Secrets shorter than this are accepted but logged.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Path of the Google callback, relative to the backend URL.
pub const GOOGLE_CALLBACK_PATH: &str = "/api/v1/user/google/callback";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener.
    pub bind_addr: String,
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Public base URL of this API, without a trailing slash.
    pub backend_url: String,
    /// Base URL of the web client, without a trailing slash.
    pub frontend_url: String,
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<String>,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Mark the auth cookie `Secure`.
    pub cookie_secure: bool,
    pub tokens: TokenConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable               | Default                        |
    /// |------------------------|--------------------------------|
    /// | `ACCESS_TOKEN_SECRET`  | required                       |
    /// | `ACCESS_TOKEN_LIFE`    | `1h`                           |
    /// | `REFRESH_TOKEN_SECRET` | required                       |
    /// | `REFRESH_TOKEN_LIFE`   | `7d`                           |
    /// | `INVITE_TOKEN_SECRET`  | `ACCESS_TOKEN_SECRET`          |
    /// | `INVITE_TOKEN_LIFE`    | `3d`                           |
    /// | `GOOGLE_CLIENT_ID`     | empty (Google login disabled)  |
    /// | `GOOGLE_CLIENT_SECRET` | empty                          |
    /// | `BACKEND_URL`          | `http://localhost:3001`        |
    /// | `FRONTEND_URL`         | `http://localhost:5173`        |
    /// | `FRONTEND_URL_CORS`    | `FRONTEND_URL` (comma list)    |
    /// | `BIND_ADDR`            | `127.0.0.1:3001`               |
    /// | `DATABASE_URL`         | unset (in-memory store)        |
    /// | `COOKIE_SECURE`        | `false`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let access_secret =
            var("ACCESS_TOKEN_SECRET").ok_or(ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        let refresh_secret =
            var("REFRESH_TOKEN_SECRET").ok_or(ConfigError::Missing("REFRESH_TOKEN_SECRET"))?;
        let invite_secret = var("INVITE_TOKEN_SECRET");

        warn_if_short("ACCESS_TOKEN_SECRET", &access_secret);
        warn_if_short("REFRESH_TOKEN_SECRET", &refresh_secret);
        if let Some(secret) = &invite_secret {
            warn_if_short("INVITE_TOKEN_SECRET", secret);
        }

        let mut tokens = TokenConfig::new(access_secret, refresh_secret);
        tokens.invite_secret = invite_secret;
        if let Some(life) = var("ACCESS_TOKEN_LIFE") {
            tokens.access_ttl = lifetime("ACCESS_TOKEN_LIFE", &life)?;
        }
        if let Some(life) = var("REFRESH_TOKEN_LIFE") {
            tokens.refresh_ttl = lifetime("REFRESH_TOKEN_LIFE", &life)?;
        }
        if let Some(life) = var("INVITE_TOKEN_LIFE") {
            tokens.invite_ttl = lifetime("INVITE_TOKEN_LIFE", &life)?;
        }

        let backend_url = base_url(
            "BACKEND_URL",
            var("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.into()),
        )?;
        let frontend_url = base_url(
            "FRONTEND_URL",
            var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.into()),
        )?;
        let cors_origins = match var("FRONTEND_URL_CORS") {
            Some(list) => list
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => vec![frontend_url.clone()],
        };

        let cookie_secure = match var("COOKIE_SECURE").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "COOKIE_SECURE",
                    reason: format!("expected true or false, got '{other}'"),
                });
            }
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            database_url: var("DATABASE_URL"),
            backend_url,
            frontend_url,
            cors_origins,
            google_client_id: var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            cookie_secure,
            tokens,
        })
    }

    /// Redirect URI registered with Google.
    pub fn google_callback_url(&self) -> String {
        format!("{}{GOOGLE_CALLBACK_PATH}", self.backend_url)
    }

    /// Where the browser lands after a successful login.
    pub fn login_success_redirect(&self, token: &str) -> String {
        self.frontend_link("/auth/callback", "token", token)
    }

    /// Where the browser lands after a failed login.
    pub fn login_failure_redirect(&self, code: &str) -> String {
        self.frontend_link("/auth", "error", code)
    }

    fn frontend_link(&self, path: &str, key: &str, value: &str) -> String {
        let base = format!("{}{path}", self.frontend_url);
        url::Url::parse_with_params(&base, &[(key, value)])
            .map(String::from)
            .unwrap_or_else(|_| format!("{base}?{key}={value}"))
    }
}

fn warn_if_short(var: &'static str, secret: &str) {
    if secret.chars().count() < MIN_SECRET_LEN {
        warn!(var, min_len = MIN_SECRET_LEN, "signing secret is shorter than recommended");
    }
}

fn lifetime(var: &'static str, value: &str) -> Result<chrono::Duration, ConfigError> {
    parse_lifetime(value).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn base_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(&value).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
