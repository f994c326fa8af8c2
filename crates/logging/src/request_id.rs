//! # Request ID Tracking
//!
//! Generates and propagates request IDs. Uses CUID2 for collision-resistant,
//! URL-safe identifiers.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// A request ID type using CUID2.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request ID.
    #[inline]
    pub fn new() -> Self { Self(cuid2::create_id()) }

    /// Accept a caller-supplied ID if it looks like one we would generate.
    pub fn try_from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let valid = (20 ..= 64).contains(&value.len()) &&
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(value.to_string()))
    }

    /// Get the request ID as a string.
    #[inline]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for RequestId {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

/// Attach a request ID to every request.
///
/// The ID is taken from `X-Request-Id` when valid, otherwise generated. It is
/// stored in the request extensions, recorded on a span wrapping the handler,
/// and echoed on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::try_from_header)
        .unwrap_or_default();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!("request", request_id = %request_id, %method, %path);
    let started = std::time::Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        crate::log_api_request!(
            method,
            path,
            response.status().as_u16(),
            started.elapsed().as_millis()
        );
    });

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_uniqueness() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_try_from_header() {
        let cuid = "k192v2g4w3zq8h6j5k12345678";
        let result = RequestId::try_from_header(cuid);
        assert_eq!(result.unwrap().as_str(), cuid);
    }

    #[test]
    fn test_try_from_header_invalid() {
        assert!(RequestId::try_from_header("invalid!@#").is_none());
        assert!(RequestId::try_from_header("short").is_none());
    }
}
