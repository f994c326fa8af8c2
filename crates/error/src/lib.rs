//! # Workledger Error Infrastructure
//!
//! Error types and API response handling shared by every Workledger crate.

pub mod middleware;
pub mod rejection;
pub mod response;

pub use middleware::ErrorHandler;
pub use response::{ApiResponse, PaginationMeta};

/// Convenience type alias for Result with AppError.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Or-pattern over every variant carrying a `message` field, binding it to `$m`.
macro_rules! detail_variants {
    ($m:ident) => {
        AppError::NotFound { message: $m }
            | AppError::BadRequest { message: $m }
            | AppError::Unauthorized { message: $m }
            | AppError::Forbidden { message: $m }
            | AppError::Conflict { message: $m }
            | AppError::Validation { message: $m }
            | AppError::RateLimit { message: $m, .. }
            | AppError::Upstream { message: $m }
            | AppError::Internal { message: $m }
            | AppError::Database { message: $m }
            | AppError::Io { message: $m }
            | AppError::Config { message: $m }
    };
}

/// Main application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("NotFound: {message}")]
    NotFound {
        message: String,
    },

    #[error("BadRequest: {message}")]
    BadRequest {
        message: String,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    #[error("JwtExpired: Token has expired")]
    JwtExpired,

    #[error("JwtInvalidToken: Invalid token")]
    JwtInvalidToken,

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
    },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    #[error("Validation: {message}")]
    Validation {
        message: String,
    },

    #[error("RateLimit: {message}")]
    RateLimit {
        message:     String,
        retry_after: u64,
    },

    #[error("Upstream: {message}")]
    Upstream {
        message: String,
    },

    #[error("Internal: {message}")]
    Internal {
        message: String,
    },

    #[error("Database: {message}")]
    Database {
        message: String,
    },

    #[error("IO: {message}")]
    Io {
        message: String,
    },

    #[error("Config: {message}")]
    Config {
        message: String,
    },
}

impl AppError {
    /// Create a not found error.
    #[inline]
    pub fn not_found(resource: impl ToString) -> Self {
        Self::NotFound {
            message: resource.to_string(),
        }
    }

    /// Create a bad request error.
    #[inline]
    pub fn bad_request(message: impl ToString) -> Self {
        Self::BadRequest {
            message: message.to_string(),
        }
    }

    /// Create an unauthorized error.
    #[inline]
    pub fn unauthorized(message: impl ToString) -> Self {
        Self::Unauthorized {
            message: message.to_string(),
        }
    }

    /// Create a forbidden error.
    #[inline]
    pub fn forbidden(message: impl ToString) -> Self {
        Self::Forbidden {
            message: message.to_string(),
        }
    }

    /// Create a conflict error.
    #[inline]
    pub fn conflict(message: impl ToString) -> Self {
        Self::Conflict {
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    #[inline]
    pub fn validation(message: impl ToString) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// Create an upstream (JIRA, Tempo, OAuth provider) error.
    #[inline]
    pub fn upstream(message: impl ToString) -> Self {
        Self::Upstream {
            message: message.to_string(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl ToString) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Create a database error.
    #[inline]
    pub fn database(message: impl ToString) -> Self {
        Self::Database {
            message: message.to_string(),
        }
    }

    /// Create a config error.
    #[inline]
    pub fn config(message: impl ToString) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }

    /// Create a rate limit error.
    #[inline]
    pub fn rate_limited(retry_after: u64) -> Self {
        Self::RateLimit {
            message: "Rate limit exceeded".to_string(),
            retry_after,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> http::StatusCode {
        match self {
            AppError::NotFound {
                ..
            } => http::StatusCode::NOT_FOUND,
            AppError::BadRequest {
                ..
            } => http::StatusCode::BAD_REQUEST,
            AppError::Unauthorized {
                ..
            }
            | AppError::JwtExpired
            | AppError::JwtInvalidToken => http::StatusCode::UNAUTHORIZED,
            AppError::Forbidden {
                ..
            } => http::StatusCode::FORBIDDEN,
            AppError::Conflict {
                ..
            } => http::StatusCode::CONFLICT,
            AppError::Validation {
                ..
            } => http::StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimit {
                ..
            } => http::StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream {
                ..
            } => http::StatusCode::BAD_GATEWAY,
            AppError::Internal {
                ..
            }
            | AppError::Database {
                ..
            }
            | AppError::Io {
                ..
            }
            | AppError::Config {
                ..
            } => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound {
                ..
            } => "NOT_FOUND",
            AppError::BadRequest {
                ..
            } => "BAD_REQUEST",
            AppError::Unauthorized {
                ..
            } => "UNAUTHORIZED",
            AppError::JwtExpired => "JWT_EXPIRED",
            AppError::JwtInvalidToken => "JWT_INVALID_TOKEN",
            AppError::Forbidden {
                ..
            } => "FORBIDDEN",
            AppError::Conflict {
                ..
            } => "CONFLICT",
            AppError::Validation {
                ..
            } => "VALIDATION_ERROR",
            AppError::RateLimit {
                ..
            } => "RATE_LIMIT_EXCEEDED",
            AppError::Upstream {
                ..
            } => "UPSTREAM_ERROR",
            AppError::Internal {
                ..
            } => "INTERNAL_ERROR",
            AppError::Database {
                ..
            } => "DATABASE_ERROR",
            AppError::Io {
                ..
            } => "IO_ERROR",
            AppError::Config {
                ..
            } => "CONFIG_ERROR",
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            detail_variants!(message) => Some(message.as_str()),
            AppError::JwtExpired | AppError::JwtInvalidToken => None,
        }
    }

    fn detail_mut(&mut self) -> Option<&mut String> {
        match self {
            detail_variants!(message) => Some(message),
            AppError::JwtExpired | AppError::JwtInvalidToken => None,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::JwtExpired => "Token has expired".to_string(),
            AppError::JwtInvalidToken => "Invalid token".to_string(),
            _ => self.detail().unwrap_or_default().to_string(),
        }
    }

    /// Get the retry-after value for rate limit errors.
    pub fn retry_after(&self) -> u64 {
        match self {
            AppError::RateLimit {
                retry_after,
                ..
            } => *retry_after,
            _ => 0,
        }
    }

    /// Whether the message is safe to show to API clients verbatim.
    pub fn is_client_facing(&self) -> bool { self.status().is_client_error() }

    /// Prefix the message with `context`. JWT errors keep their fixed text.
    pub fn context(mut self, context: impl ToString) -> Self {
        if let Some(message) = self.detail_mut() {
            *message = format!("{}: {}", context.to_string(), message);
        }
        self
    }
}

/// Convert anyhow errors to AppError.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}

/// Convert std::io errors to AppError.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Convert Sea-ORM database errors to AppError.
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database {
            message: err.to_string(),
        }
    }
}

/// Convert JIRA/Tempo client errors to AppError.
impl From<integrations::IntegrationError> for AppError {
    fn from(err: integrations::IntegrationError) -> Self {
        match err.status_code() {
            Some(429) => {
                Self::RateLimit {
                    message:     err.to_string(),
                    retry_after: err.retry_after().unwrap_or(0),
                }
            },
            _ => {
                Self::Upstream {
                    message: err.to_string(),
                }
            },
        }
    }
}

/// Convert validator validation errors to AppError.
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| format!("Invalid value for '{}'", field))
                })
            })
            .collect();
        messages.sort();

        let message = if messages.is_empty() {
            "Validation failed".to_string()
        }
        else {
            messages.join(", ")
        };

        Self::Validation {
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_not_found() {
        let err = AppError::not_found("Team not found");
        assert_eq!(err.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.to_string().contains("NotFound"));
    }

    #[test]
    fn test_error_unauthorized_variants() {
        assert_eq!(
            AppError::unauthorized("Missing authorization header").status(),
            http::StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::JwtExpired.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::JwtExpired.code(), "JWT_EXPIRED");
        assert_eq!(
            AppError::JwtInvalidToken.status(),
            http::StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_forbidden() {
        let err = AppError::forbidden("Admin privileges required");
        assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn test_error_validation() {
        let err = AppError::validation("start_date must not be after end_date");
        assert_eq!(err.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_error_upstream() {
        let err = AppError::upstream("JIRA returned HTTP 500");
        assert_eq!(err.status(), http::StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert!(!err.is_client_facing());
    }

    #[test]
    fn test_error_rate_limited() {
        let err = AppError::rate_limited(60);
        assert_eq!(err.status(), http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.retry_after(), 60);
        assert!(err.is_client_facing());
    }

    #[test]
    fn test_server_errors_are_not_client_facing() {
        assert!(!AppError::database("disk I/O error").is_client_facing());
        assert!(!AppError::internal("boom").is_client_facing());
        assert!(AppError::conflict("Team already exists").is_client_facing());
    }

    #[test]
    fn test_error_context() {
        let err = AppError::not_found("Invoice").context("Issuing invoice");
        assert_eq!(err.message(), "Issuing invoice: Invoice");
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_jwt_context_is_unchanged() {
        let err = AppError::JwtExpired.context("Authenticating");
        assert_eq!(err.message(), "Token has expired");
    }

    #[test]
    fn test_from_db_err() {
        let err: AppError = sea_orm::DbErr::Custom("locked".to_string()).into();
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_from_integration_rate_limit() {
        let upstream = integrations::IntegrationError::Status {
            service:     "tempo",
            status:      429,
            message:     "Too many requests".to_string(),
            retry_after: Some(12),
        };
        let err: AppError = upstream.into();
        assert_eq!(err.status(), http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.retry_after(), 12);
    }

    #[test]
    fn test_from_integration_server_error() {
        let upstream = integrations::IntegrationError::Status {
            service:     "jira",
            status:      503,
            message:     "Service unavailable".to_string(),
            retry_after: None,
        };
        let err: AppError = upstream.into();
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::Validate;

        #[derive(Validate)]
        struct RateInput {
            #[validate(range(min = 0.0, message = "hourly_rate must not be negative"))]
            hourly_rate: f64,
        }

        let input = RateInput {
            hourly_rate: -5.0,
        };
        let errors = input.validate().unwrap_err();
        let app_error: AppError = errors.into();

        match app_error {
            AppError::Validation {
                message,
            } => {
                assert_eq!(message, "hourly_rate must not be negative");
            },
            _ => panic!("Expected Validation error"),
        }
    }
}
