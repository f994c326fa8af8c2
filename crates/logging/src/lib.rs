//! # Workledger Logging Infrastructure
//!
//! Structured logging for the Workledger services.
//! Provides tracing integration with JSON output and environment-based configuration.

pub mod config;
pub mod macros;
pub mod request_id;

pub use config::LoggingConfig;
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
// Re-export tracing macros
pub use tracing::{debug, error, info, trace, warn};
pub use tracing_appender::non_blocking::WorkerGuard;

/// Error returned when the global subscriber cannot be installed.
pub type InitError = tracing::subscriber::SetGlobalDefaultError;

/// Initialize the logging system.
///
/// # Arguments
///
/// * `level` - Log level or `EnvFilter` directive (e.g. `info,sea_orm=warn`)
/// * `format` - Output format (json, pretty, compact)
/// * `log_file` - Optional path to log file
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process when a log file is configured.
pub fn init(level: &str, format: &str, log_file: Option<&str>) -> Result<Option<WorkerGuard>, InitError> {
    init_with_config(LoggingConfig::from_env(level, format, log_file))
}

/// Initialize logging with a custom configuration.
pub fn init_with_config(config: LoggingConfig) -> Result<Option<WorkerGuard>, InitError> {
    let (subscriber, guard) = config.build();
    tracing::subscriber::set_global_default(subscriber)?;
    info!(
        level = %config.level,
        format = %config.format,
        environment = %config.environment,
        "Logging initialized"
    );
    Ok(guard)
}
