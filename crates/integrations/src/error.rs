//! Integration error type.

/// Failure talking to JIRA, Tempo or an OAuth provider.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{service} returned HTTP {status}: {message}")]
    Status {
        service:     &'static str,
        status:      u16,
        message:     String,
        retry_after: Option<u64>,
    },

    #[error("{service} request failed: {message}")]
    Transport {
        service:   &'static str,
        message:   String,
        retryable: bool,
    },

    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("invalid {service} configuration: {message}")]
    Config {
        service: &'static str,
        message: String,
    },
}

impl IntegrationError {
    /// Classify a reqwest failure. Timeouts and connection failures are transient.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode {
                service,
                message: err.to_string(),
            };
        }
        Self::Transport {
            service,
            retryable: err.is_timeout() || err.is_connect(),
            message: err.to_string(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status {
                status,
                ..
            } => matches!(status, 408 | 429 | 500 ..= 599),
            Self::Transport {
                retryable,
                ..
            } => *retryable,
            Self::Decode {
                ..
            }
            | Self::Config {
                ..
            } => false,
        }
    }

    /// Upstream HTTP status, when the failure was an HTTP response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status {
                status,
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// `Retry-After` seconds advertised by the upstream.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Status {
                retry_after,
                ..
            } => *retry_after,
            _ => None,
        }
    }

    /// Short label for logs and sync summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status {
                status: 429,
                ..
            } => "rate_limit",
            Self::Status {
                status: 401 | 403,
                ..
            } => "invalid_credentials",
            Self::Status {
                status: 404,
                ..
            } => "not_found",
            Self::Status {
                ..
            } => "http_error",
            Self::Transport {
                retryable: true,
                ..
            } => "network",
            Self::Transport {
                ..
            } => "request",
            Self::Decode {
                ..
            } => "decode",
            Self::Config {
                ..
            } => "config",
        }
    }
}
