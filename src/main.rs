use std::net::SocketAddr;

use clap::Parser;
use marquee::cli::{
    Args, build_config, build_source, init_logging, load_secrets, open_database,
};
use marquee::create_app;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real environment variables still apply.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_format);

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let Some(secrets) = load_secrets(
        args.access_secret_file.as_deref(),
        args.refresh_secret_file.as_deref(),
    ) else {
        std::process::exit(1);
    };

    let Some(source) = build_source(args.omdb_api_key.clone(), &args.omdb_url) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "Failed to read listening address");
            std::process::exit(1);
        }
    };

    let config = build_config(db, secrets, source, &args);
    let app = create_app(&config);

    info!(address = %local_addr, "Listening");

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, make_service).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
