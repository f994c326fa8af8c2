//! # Logging Configuration
//!
//! Configuration for the logging subsystem.
//! Supports environment variables and programmatic configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "WORKLEDGER_LOG_FORMAT";
/// Environment variable naming a log file.
pub const LOG_FILE_ENV: &str = "WORKLEDGER_LOG_FILE";
/// Environment variable naming the deployment environment.
pub const ENVIRONMENT_ENV: &str = "WORKLEDGER_ENV";

/// Boxed subscriber plus the optional file writer guard.
pub type BuiltSubscriber = (Box<dyn tracing::Subscriber + Send + Sync>, Option<WorkerGuard>);

/// Logging configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format (json, pretty, compact)
    #[serde(default = "default_format")]
    pub format: String,

    /// Optional log file path
    #[serde(default)]
    pub log_file: Option<String>,

    /// Environment (development, testing, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_level() -> String { "info".to_string() }

fn default_format() -> String { "compact".to_string() }

fn default_environment() -> String { "development".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level:       default_level(),
            format:      default_format(),
            log_file:    None,
            environment: default_environment(),
        }
    }
}

impl LoggingConfig {
    /// Create configuration from environment variables, falling back to the
    /// given values.
    pub fn from_env(level: &str, format: &str, log_file: Option<&str>) -> Self {
        Self {
            level:       std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
            format:      std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| format.to_string()),
            log_file:    std::env::var(LOG_FILE_ENV)
                .ok()
                .or(log_file.map(|s| s.to_string())),
            environment: std::env::var(ENVIRONMENT_ENV).unwrap_or_else(|_| default_environment()),
        }
    }

    /// Parse the level into a filter, falling back to `info` on bad input.
    pub fn filter(&self) -> EnvFilter { EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info")) }

    /// Build the tracing subscriber from this configuration.
    pub fn build(&self) -> BuiltSubscriber {
        let (file_layer, guard) = match self.log_file {
            Some(ref log_file) => {
                let path = Path::new(log_file);
                let directory = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "workledger.log".to_string());
                let appender = tracing_appender::rolling::hourly(directory, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (
                    Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
                    Some(guard),
                )
            },
            None => (None, None),
        };

        let registry = Registry::default().with(self.filter()).with(file_layer);

        let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match self.format.as_str() {
            "pretty" => {
                Box::new(
                    registry.with(
                        fmt::layer()
                            .pretty()
                            .with_timer(fmt::time::UtcTime::rfc_3339()),
                    ),
                )
            },
            "compact" => {
                Box::new(
                    registry.with(
                        fmt::layer()
                            .compact()
                            .with_timer(fmt::time::UtcTime::rfc_3339()),
                    ),
                )
            },
            _ => {
                Box::new(
                    registry.with(
                        fmt::layer()
                            .json()
                            .with_current_span(true)
                            .with_timer(fmt::time::UtcTime::rfc_3339()),
                    ),
                )
            },
        };

        (subscriber, guard)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_config_from_args() {
        let config = LoggingConfig::from_env("info", "json", None);
        assert_eq!(config.format, "json");
        assert_eq!(config.environment, "development");
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        // Safe in test context - serialised with the other env tests
        unsafe {
            std::env::set_var("RUST_LOG", "debug");
            std::env::set_var(LOG_FORMAT_ENV, "pretty");
            std::env::set_var(ENVIRONMENT_ENV, "production");
        }

        let config = LoggingConfig::from_env("info", "json", None);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, "pretty");
        assert_eq!(config.environment, "production");

        unsafe {
            std::env::remove_var("RUST_LOG");
            std::env::remove_var(LOG_FORMAT_ENV);
            std::env::remove_var(ENVIRONMENT_ENV);
        }
    }

    #[test]
    fn test_filter_accepts_directives() {
        let config = LoggingConfig {
            level: "info,sea_orm=warn,server=debug".to_string(),
            ..Default::default()
        };
        assert!(config.filter().to_string().contains("sea_orm=warn"));
    }

    #[test]
    fn test_build_each_format() {
        for format in ["json", "pretty", "compact", "unknown"] {
            let config = LoggingConfig {
                format: format.to_string(),
                ..Default::default()
            };
            let (_subscriber, guard) = config.build();
            assert!(guard.is_none());
        }
    }
}
