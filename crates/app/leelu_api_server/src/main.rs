//! Leelu API server binary.
//!
//! Reads configuration from the environment (and `.env`), connects to
//! PostgreSQL when `DATABASE_URL` is set, and serves the HTTP API.

use std::sync::Arc;

use clap::Parser;
use leelu_api::AppState;
use leelu_api::config::ApiConfig;
use leelu_core::oauth::{GoogleOAuthConfig, GoogleProvider, IdentityProvider};
use leelu_core::store::{MemoryUserStore, PgUserStore, UserStore};
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "info,leelu_api=debug,leelu_core=debug";

#[derive(Parser, Debug)]
#[command(name = "leelu_api_server", about = "Leelu API server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<String>,

    /// Keep users in memory even when `DATABASE_URL` is set.
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env()?;
    if let Some(addr) = args.bind_addr.clone() {
        config.bind_addr = addr;
    }

    info!(
        version = leelu_core::version(),
        bind_addr = %config.bind_addr,
        "starting leelu_api_server"
    );

    let store = open_store(&config, &args).await?;
    let identity_provider = google_provider(&config);

    let state = AppState::new(config, store, identity_provider)?;
    let _cleanup = state.oauth_state.spawn_cleanup_task();
    let bind_addr = state.config.bind_addr.clone();
    let app = leelu_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn open_store(
    config: &ApiConfig,
    args: &Args,
) -> Result<Arc<dyn UserStore>, Box<dyn std::error::Error>> {
    match (&config.database_url, args.in_memory) {
        (Some(url), false) => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = leelu_core::db::connect(url, args.max_connections).await?;
            leelu_core::db::migrate(&pool).await?;
            Ok(Arc::new(PgUserStore::new(pool)))
        }
        (None, false) => {
            warn!("DATABASE_URL is not set, users are kept in memory and lost on restart");
            Ok(Arc::new(MemoryUserStore::new()))
        }
        (_, true) => {
            info!("using in-memory user store");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

fn google_provider(config: &ApiConfig) -> Option<Arc<dyn IdentityProvider>> {
    let google = GoogleOAuthConfig::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_callback_url(),
    );
    match GoogleProvider::new(google) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!(error = %e, "Google sign-in disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
