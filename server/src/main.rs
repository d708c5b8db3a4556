//! winlic license server
//!
//! Serves the device-facing license API and the admin API over HTTP.
//!
//! Usage:
//!   winlic-server --port 3000 --database /var/lib/winlic/winlic.db

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use winlic_server::config::Args;
use winlic_server::{build_router, AdminAuth, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("winlic server starting...");
    let store = args
        .open_store()
        .with_context(|| format!("failed to open database {}", args.database.display()))?;
    info!("database: {}", args.database.display());

    let auth = AdminAuth::new(args.admin_api_key.as_deref());
    if !auth.is_configured() {
        warn!("ADMIN_API_KEY is not set; all admin requests will be rejected");
    }

    let app = build_router(AppState::new(Arc::new(store), auth));
    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("winlic server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
