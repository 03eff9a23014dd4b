pub mod api;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod redirect;

use api::{AppState, create_router};
use auth::SessionAuthority;
use axum::Router;
use catalog::{CachePopulator, MovieSource};
use db::Database;
use jwt::TokenCodec;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret signing refresh tokens; must differ from the access secret
    pub refresh_secret: Vec<u8>,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Where catalog misses are filled from
    pub source: Arc<dyn MovieSource>,
    /// Search keyword used to seed an empty catalog
    pub seed_query: String,
    /// Login and signup attempts allowed per client and minute
    pub login_attempts_per_minute: u32,
    /// IP extraction strategy (requires running behind a proxy)
    pub ip_extractor: Option<cli::IpExtractor>,
}

/// Credential endpoint limiters for the given configuration.
fn rate_limits(config: &ServerConfig) -> RateLimitConfig {
    RateLimitConfig::new(config.login_attempts_per_minute, config.ip_extractor)
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    create_app_with_limits(config, rate_limits(config))
}

fn create_app_with_limits(config: &ServerConfig, limits: RateLimitConfig) -> Router {
    let tokens = Arc::new(TokenCodec::new(
        &config.access_secret,
        &config.refresh_secret,
    ));
    let sessions = SessionAuthority::new(config.db.clone(), tokens, config.secure_cookies);
    let catalog = Arc::new(CachePopulator::new(
        config.db.clone(),
        config.source.clone(),
        config.seed_query.clone(),
    ));

    let state = AppState {
        db: config.db.clone(),
        sessions,
        catalog,
    };

    create_router(state, limits)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let limits = rate_limits(&config);
    rate_limit::spawn_pruner(limits.clone());
    let app = create_app_with_limits(&config, limits);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
