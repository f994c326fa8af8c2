//! # Serve
//!
//! Connects, migrates and serves the API until Ctrl-C or SIGTERM.

use std::net::SocketAddr;

use anyhow::{anyhow, Context as _};
use integrations::RetryConfig;
use migration::{Migrator, MigratorTrait as _};
use server::{auth::sessions::cleanup_expired_sessions, create_app_router, http_client, AppState, ServerResult};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    commands::ServeArgs,
    config::{parse_socket_addr, AppConfig},
};

pub async fn serve(config: AppConfig, args: &ServeArgs) -> anyhow::Result<()> {
    let address = parse_socket_addr(&args.host, args.port)
        .map_err(|e| anyhow!("Invalid address {}:{}: {}", args.host, args.port, e))?;

    info!(target: "serve", "Connecting to database...");
    let db = migration::connect_to_database(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    info!(target: "serve", "Database migrations completed successfully");

    match cleanup_expired_sessions(&db).await {
        Ok(removed) => info!(target: "serve", removed, "Expired sessions removed"),
        Err(e) => warn!(target: "serve", error = %e, "Session cleanup failed"),
    }

    if config.settings.dev_mode {
        warn!(target: "serve", "Dev mode is on: POST /api/auth/dev/login is enabled");
    }

    let http = http_client(config.http_timeout).context("Failed to build HTTP client")?;
    let state = AppState::new(db, config.jwt, http)
        .with_oauth(config.oauth)
        .with_retry(RetryConfig::default().with_max_retries(config.sync_max_retries))
        .with_settings(config.settings);
    let app = create_app_router(state);

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    let started = ServerResult::new(&address.to_string());
    info!(target: "serve", address = %started.address, started_at = %started.started_at, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!(target: "serve", "Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
#[allow(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! macro triggers false positive"
)]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(target: "serve", error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(target: "serve", error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(target: "serve", "Shutdown signal received");
}
