//! # Validate Command
//!
//! Checks the configuration and that the database is reachable, without
//! binding a socket.

use anyhow::Context as _;
use tracing::info;

use crate::config::AppConfig;

pub async fn validate(config: &AppConfig) -> anyhow::Result<()> {
    migration::connect_to_database(&config.database_url)
        .await
        .with_context(|| format!("Database is not reachable at {}", config.database_url))?;
    server::http_client(config.http_timeout).context("Failed to build HTTP client")?;

    info!(
        target: "validate",
        oauth = config.oauth.is_some(),
        dev_mode = config.settings.dev_mode,
        sync_max_retries = config.sync_max_retries,
        http_timeout_secs = config.http_timeout.as_secs(),
        "Configuration is valid"
    );
    println!("Configuration OK");
    Ok(())
}
