//! # Workledger API Server
//!
//! Axum-based HTTP API over the Workledger database.
//!
//! ## Modules
//!
//! - [`auth`]: OAuth login, token refresh, sessions and invitations
//! - [`settings`]: teams, users, JIRA instances, complementary groups, holidays
//! - [`worklogs`]: worklog store and listing
//! - [`sync`]: Tempo/JIRA sync orchestration
//! - [`analytics`]: dashboard, epic, team, user and issue reports
//! - [`billing`]: rate resolution, preview, invoices, export and billing catalog
//! - [`dto`]: Request/response data transfer objects
//! - [`middleware`]: authentication middleware
//! - [`router`]: API route configuration

use std::time::{Duration, Instant};

use ::auth::{GoogleOAuthConfig, JwtConfig};
use integrations::{RetryConfig, TempoClient};

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod dto;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod settings;
pub mod sync;
pub mod utils;
pub mod worklogs;

pub use router::create_app_router;

/// Tunables that are not secrets.
#[derive(Clone, Debug)]
pub struct ServerSettings {
    /// Enables `POST /api/auth/dev/login`
    pub dev_mode:                bool,
    pub invitation_expire_hours: i64,
    /// Expected hours per working day and user
    pub daily_working_hours:     f64,
    pub refresh_ttl_days:        i64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            dev_mode:                false,
            invitation_expire_hours: 72,
            daily_working_hours:     8.0,
            refresh_ttl_days:        30,
        }
    }
}

/// Upper bound for one JIRA, Tempo or OAuth request when none is configured.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound client with a whole-request timeout and a tighter connect timeout.
pub fn http_client(timeout: Duration) -> error::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .map_err(|e| error::AppError::config(format!("Failed to build HTTP client: {}", e)))
}

/// Application state shared across request handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection pool
    pub db:             sea_orm::DbConn,
    pub jwt_config:     JwtConfig,
    /// `None` disables the OAuth login endpoints
    pub oauth:          Option<GoogleOAuthConfig>,
    /// Shared client for JIRA, Tempo and OAuth calls
    pub http:           reqwest::Client,
    /// Backoff for upstream 429/5xx during sync
    pub retry:          RetryConfig,
    pub tempo_base_url: String,
    pub settings:       ServerSettings,
    /// Server start time for uptime calculation
    pub start_time:     Instant,
}

impl AppState {
    pub fn new(db: sea_orm::DbConn, jwt_config: JwtConfig, http: reqwest::Client) -> Self {
        Self {
            db,
            jwt_config,
            oauth: None,
            http,
            retry: RetryConfig::default(),
            tempo_base_url: TempoClient::DEFAULT_BASE_URL.to_string(),
            settings: ServerSettings::default(),
            start_time: Instant::now(),
        }
    }

    pub fn with_oauth(mut self, oauth: Option<GoogleOAuthConfig>) -> Self {
        self.oauth = oauth;
        self
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_tempo_base_url(mut self, url: impl Into<String>) -> Self {
        self.tempo_base_url = url.into();
        self
    }

    pub fn with_settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Server initialization result
#[derive(Debug)]
pub struct ServerResult {
    /// The address the server is bound to
    pub address:    String,
    /// Server start timestamp for logging
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl ServerResult {
    #[must_use]
    pub fn new(address: &str) -> Self {
        Self {
            address:    address.to_string(),
            started_at: chrono::Utc::now(),
        }
    }
}
