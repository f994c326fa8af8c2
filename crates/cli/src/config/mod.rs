//! # Configuration
//!
//! Process configuration read from the environment (after `.env` loading).

use std::{net::SocketAddr, time::Duration};

use auth::{GoogleOAuthConfig, JwtConfig};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret as _, SecretString};
use server::{ServerSettings, DEFAULT_HTTP_TIMEOUT};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://workledger.db?mode=rwc";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    Missing { name: &'static str },

    /// A variable is set but does not parse.
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be base64 encoded and at least 32 bytes")]
    WeakJwtSecret,

    #[error("Google OAuth needs GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URI together")]
    IncompleteOAuth,
}

/// Everything `serve` needs besides the bind address.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url:     String,
    pub jwt:              JwtConfig,
    pub oauth:            Option<GoogleOAuthConfig>,
    pub settings:         ServerSettings,
    pub sync_max_retries: u32,
    /// Whole-request timeout for JIRA, Tempo and OAuth calls
    pub http_timeout:     Duration,
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|name| std::env::var(name).ok()) }

    /// Read the configuration through `lookup`, treating empty values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing {
            name: "JWT_SECRET",
        })?;
        let secret = SecretString::from(secret);
        check_jwt_secret(&secret)?;

        let mut jwt = JwtConfig::new(secret);
        jwt.access_ttl_seconds = parse_or(&get, "JWT_ACCESS_TTL_SECONDS", jwt.access_ttl_seconds)?;
        if let Some(issuer) = get("JWT_ISSUER") {
            jwt.issuer = issuer;
        }
        if let Some(audience) = get("JWT_AUDIENCE") {
            jwt.audience = audience;
        }

        let oauth = match (
            get("GOOGLE_CLIENT_ID"),
            get("GOOGLE_CLIENT_SECRET"),
            get("GOOGLE_REDIRECT_URI"),
        ) {
            (Some(id), Some(secret), Some(redirect)) => {
                Some(GoogleOAuthConfig::new(id, SecretString::from(secret), redirect))
            },
            (None, None, None) => None,
            _ => return Err(ConfigError::IncompleteOAuth),
        };

        let defaults = ServerSettings::default();
        let settings = ServerSettings {
            dev_mode:                parse_or(&get, "WORKLEDGER_DEV_MODE", defaults.dev_mode)?,
            invitation_expire_hours: parse_or(&get, "INVITATION_EXPIRE_HOURS", defaults.invitation_expire_hours)?,
            daily_working_hours:     parse_or(&get, "DAILY_WORKING_HOURS", defaults.daily_working_hours)?,
            refresh_ttl_days:        parse_or(&get, "JWT_REFRESH_TTL_DAYS", defaults.refresh_ttl_days)?,
        };
        if settings.daily_working_hours <= 0.0 {
            return Err(ConfigError::Invalid {
                name:  "DAILY_WORKING_HOURS",
                value: settings.daily_working_hours.to_string(),
            });
        }

        let http_timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT.as_secs())?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name:  "HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt,
            oauth,
            settings,
            sync_max_retries: parse_or(&get, "SYNC_MAX_RETRIES", 3)?,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

fn parse_or<T, F>(get: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => {
            value.trim().parse().map_err(|_| {
                ConfigError::Invalid {
                    name,
                    value,
                }
            })
        },
        None => Ok(default),
    }
}

fn check_jwt_secret(secret: &SecretString) -> Result<(), ConfigError> {
    match STANDARD.decode(secret.expose_secret()) {
        Ok(bytes) if bytes.len() >= 32 => Ok(()),
        _ => Err(ConfigError::WeakJwtSecret),
    }
}

/// Parses a host and port into a SocketAddr.
///
/// Bare IPv6 hosts are bracketed before the port is appended.
pub fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, std::net::AddrParseError> {
    let addr_str = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    }
    else {
        format!("{}:{}", host, port)
    };
    addr_str.parse()
}
