//! # Logging Macros
//!
//! Convenience macros for structured logging with consistent targets and
//! field names.

/// Log an API request with method, path, and status.
#[macro_export]
macro_rules! log_api_request {
    ($method:expr, $path:expr, $status:expr, $duration:expr) => {
        tracing::info!(
            target: "api",
            method = %$method,
            path = %$path,
            status = %$status,
            duration_ms = %$duration,
            "API request"
        )
    };
}

/// Log a database operation with duration and table name.
#[macro_export]
macro_rules! log_db_query {
    ($operation:expr, $table:expr, $duration:expr) => {
        tracing::debug!(
            target: "database",
            operation = %$operation,
            table = %$table,
            duration_ms = %$duration,
            "Database query"
        )
    };
}

/// Log an authentication event.
#[macro_export]
macro_rules! log_auth_event {
    ($event:expr, $company_id:expr, $email:expr) => {
        tracing::info!(
            target: "auth",
            event = %$event,
            company_id = %$company_id,
            email = %$email,
            "Authentication event"
        )
    };
}

/// Log the outcome of syncing one JIRA instance.
#[macro_export]
macro_rules! log_sync_event {
    ($company_id:expr, $instance:expr, $status:expr, $synced:expr) => {
        tracing::info!(
            target: "sync",
            company_id = %$company_id,
            instance = %$instance,
            status = %$status,
            worklogs = $synced,
            "Instance sync finished"
        )
    };
}

/// Measure and log the duration of a block of code.
///
/// # Example
///
/// ```rust
/// use logging::measure_duration;
///
/// let total = measure_duration!("billing", "preview", { 40 + 2 });
/// assert_eq!(total, 42);
/// ```
#[macro_export]
macro_rules! measure_duration {
    ($target:expr, $context:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        tracing::debug!(
            target: $target,
            context = %$context,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Operation completed"
        );
        result
    }};
}
