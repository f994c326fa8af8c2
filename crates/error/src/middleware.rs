//! # Error Responses
//!
//! Converts [`AppError`] into axum responses.
//!
//! ```rust
//! use error::{AppError, ErrorHandler};
//!
//! let response = ErrorHandler.to_response(&AppError::not_found("Team not found"));
//! assert_eq!(response.status(), 404);
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{response::ApiResponse, AppError};

/// Error handler that converts errors to HTTP responses.
///
/// Server-side details are logged, never sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler;

impl ErrorHandler {
    /// Convert an error to a response.
    pub fn to_response(&self, err: &AppError) -> Response {
        let status = err.status();
        let message = if err.is_client_facing() {
            err.message()
        }
        else {
            match status {
                StatusCode::BAD_GATEWAY => "Upstream service error".to_string(),
                _ => "Internal server error".to_string(),
            }
        };

        if status.is_server_error() {
            tracing::error!(code = err.code(), error = %err, "Request failed");
        }

        let body = ApiResponse::<()>::error(err.code(), message);
        let mut res = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        if let AppError::RateLimit {
            retry_after,
            ..
        } = err
        {
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
        }

        res
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response { ErrorHandler.to_response(&self) }
}
