//! CLI argument parsing, validation, and startup helpers.

use std::net::IpAddr;
use std::sync::Arc;

use crate::ServerConfig;
use crate::catalog::{DisabledSource, MovieSource, OmdbClient};
use crate::db::Database;
use clap::Parser;
use tracing::{error, info, warn};
use url::Url;

const MIN_SECRET_LENGTH: usize = 32;

pub const ACCESS_SECRET_ENV: &str = "ACCESS_SECRET";
pub const REFRESH_SECRET_ENV: &str = "REFRESH_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Header carrying the real client IP when running behind a reverse proxy.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpExtractor {
    /// `CF-Connecting-IP`, set by Cloudflare
    CfConnectingIp,
    /// `X-Real-IP`, as set by nginx
    XRealIp,
    /// Last entry of `X-Forwarded-For`, the one appended by the nearest proxy
    XForwardedFor,
}

impl IpExtractor {
    pub fn header_name(&self) -> &'static str {
        match self {
            IpExtractor::CfConnectingIp => "cf-connecting-ip",
            IpExtractor::XRealIp => "x-real-ip",
            IpExtractor::XForwardedFor => "x-forwarded-for",
        }
    }

    /// Parse the client IP out of this extractor's header value.
    pub fn extract(&self, header_value: &str) -> Result<String, &'static str> {
        let candidate = match self {
            IpExtractor::XForwardedFor => header_value.rsplit(',').next().unwrap_or(header_value),
            IpExtractor::CfConnectingIp | IpExtractor::XRealIp => header_value,
        };
        candidate
            .trim()
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| "IP header does not contain a valid IP address")
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "marquee", about = "Movie catalog with watchlists, favorites and comments")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Path to SQLite database file (":memory:" for a throwaway database)
    #[arg(short, long, env = "DB_NAME", default_value = "marquee.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer ACCESS_SECRET
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer REFRESH_SECRET
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Set the Secure flag on session cookies (required behind HTTPS)
    #[arg(long, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// OMDb API key. Without it only already cached movies are served
    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
    pub omdb_api_key: Option<String>,

    /// OMDb base URL
    #[arg(long, env = "OMDB_URL", default_value = crate::catalog::DEFAULT_OMDB_URL)]
    pub omdb_url: String,

    /// Search keyword used to seed an empty catalog
    #[arg(long, env = "SEED_QUERY", default_value = "Superman")]
    pub seed_query: String,

    /// Login and signup attempts allowed per client and minute
    #[arg(long, env = "LOGIN_RATE_LIMIT", default_value_t = crate::rate_limit::DEFAULT_ATTEMPTS_PER_MINUTE)]
    pub login_rate_limit: u32,

    /// Read client IPs from this header (requires running behind a proxy that sets it)
    #[arg(long, env = "IP_HEADER", value_enum)]
    pub ip_header: Option<IpExtractor>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Signing secrets for both token kinds.
pub struct Secrets {
    pub access: Vec<u8>,
    pub refresh: Vec<u8>,
}

/// Load one secret from the environment variable `env_var` or from `file`.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(env_var: &str, file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're at startup before any task is spawned,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read {} file", env_var);
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the environment variable (recommended) or pass a secret file",
            env_var
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_var, MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load and cross-check both token secrets.
pub fn load_secrets(access_file: Option<&str>, refresh_file: Option<&str>) -> Option<Secrets> {
    secrets_from(
        load_secret(ACCESS_SECRET_ENV, access_file)?,
        load_secret(REFRESH_SECRET_ENV, refresh_file)?,
    )
}

fn secrets_from(access: String, refresh: String) -> Option<Secrets> {
    if access == refresh {
        error!(
            "{} and {} must differ",
            ACCESS_SECRET_ENV, REFRESH_SECRET_ENV
        );
        return None;
    }
    Some(Secrets {
        access: access.into_bytes(),
        refresh: refresh.into_bytes(),
    })
}

/// Pick the movie source. Returns None and logs an error if the URL is invalid.
pub fn build_source(api_key: Option<String>, omdb_url: &str) -> Option<Arc<dyn MovieSource>> {
    let url = match Url::parse(omdb_url) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %omdb_url, error = %e, "Invalid OMDb URL");
            return None;
        }
    };

    match api_key.filter(|key| !key.is_empty()) {
        Some(key) => Some(Arc::new(OmdbClient::new(url, key))),
        None => {
            warn!("OMDB_API_KEY is not set; serving cached movies only");
            Some(Arc::new(DisabledSource))
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    secrets: Secrets,
    source: Arc<dyn MovieSource>,
    args: &Args,
) -> ServerConfig {
    ServerConfig {
        db,
        access_secret: secrets.access,
        refresh_secret: secrets.refresh,
        secure_cookies: args.secure_cookies,
        source,
        seed_query: args.seed_query.clone(),
        login_attempts_per_minute: args.login_rate_limit,
        ip_extractor: args.ip_header,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
