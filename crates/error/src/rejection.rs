//! # Rejection Handlers
//!
//! Conversions from axum extractor rejections into [`AppError`], so malformed
//! bodies and query strings surface as 422 in the standard error envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};

use crate::AppError;

/// Pull the field name out of serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
    let start = message.find("missing field `")? + "missing field `".len();
    let len = message[start ..].find('`')?;
    Some(&message[start .. start + len])
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match missing_field(&message) {
            Some(field) => AppError::validation(format!("Missing required field: {}", field)),
            None => AppError::validation(message),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self { AppError::not_found(rejection.body_text()) }
}
