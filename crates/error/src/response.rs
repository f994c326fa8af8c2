//! # API Response Types
//!
//! Envelope used for error bodies and paginated listings.
//!
//! ## Response Format
//!
//! ```json
//! {
//!   "status": "error",
//!   "code": "NOT_FOUND",
//!   "message": "Team not found"
//! }
//! ```

use serde::{Deserialize, Serialize};

/// API response metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResponseMeta {
    /// Request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PaginationMeta {
    /// Current page number (1-indexed).
    pub page:        u64,
    /// Number of items per page.
    pub per_page:    u64,
    /// Total number of items.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Has next page.
    pub has_next:    bool,
    /// Has previous page.
    pub has_prev:    bool,
}

impl PaginationMeta {
    /// Maximum allowed page number.
    const MAX_PAGE: u64 = 1_000_000;

    /// Create pagination meta, clamping `page` into `1..=MAX_PAGE`.
    pub fn new(page: u64, per_page: u64, total_items: u64) -> Self {
        let page = page.clamp(1, Self::MAX_PAGE);
        let total_pages = if per_page == 0 {
            0
        }
        else {
            total_items.div_ceil(per_page)
        };

        Self {
            page,
            per_page,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Zero-based row offset for the current page, `None` on overflow.
    pub fn offset(&self) -> Option<u64> { self.page.checked_sub(1)?.checked_mul(self.per_page) }
}

/// API response type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ApiResponse<T> {
    /// Success response.
    Success {
        data: T,
        #[serde(flatten, skip_serializing_if = "Option::is_none")]
        meta: Option<ResponseMeta>,
    },
    /// Error response.
    Error {
        code:       String,
        message:    String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details:    Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl<T> ApiResponse<T> {
    /// Create a success response with data.
    #[inline]
    pub fn ok(data: T) -> Self {
        ApiResponse::Success {
            data,
            meta: None,
        }
    }

    /// Create an error response.
    #[inline]
    pub fn error(code: impl ToString, message: impl ToString) -> Self {
        ApiResponse::Error {
            code:       code.to_string(),
            message:    message.to_string(),
            details:    None,
            request_id: None,
        }
    }

    /// Create an error response with details.
    #[inline]
    pub fn error_with_details(code: impl ToString, message: impl ToString, details: serde_json::Value) -> Self {
        ApiResponse::Error {
            code:       code.to_string(),
            message:    message.to_string(),
            details:    Some(details),
            request_id: None,
        }
    }

    /// Attach a request id to either variant.
    pub fn with_request_id(mut self, id: impl ToString) -> Self {
        match &mut self {
            ApiResponse::Success {
                meta,
                ..
            } => {
                *meta = Some(ResponseMeta {
                    request_id: Some(id.to_string()),
                })
            },
            ApiResponse::Error {
                request_id,
                ..
            } => *request_id = Some(id.to_string()),
        }
        self
    }

    /// Check if this is a success response.
    #[inline]
    pub fn is_success(&self) -> bool { matches!(self, ApiResponse::Success { .. }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_ok() {
        let response = ApiResponse::ok("test data");
        assert!(response.is_success());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], "test data");
    }

    #[test]
    fn test_response_error() {
        let response: ApiResponse<()> = ApiResponse::error("NOT_FOUND", "Resource not found");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Resource not found");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_response_request_id() {
        let response: ApiResponse<()> = ApiResponse::error("FORBIDDEN", "nope").with_request_id("req-1");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["requestId"], "req-1");
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(2, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);
        assert_eq!(meta.offset(), Some(10));
    }

    #[test]
    fn test_pagination_meta_clamps_page() {
        let meta = PaginationMeta::new(0, 10, 0);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_pagination_zero_per_page() {
        let meta = PaginationMeta::new(1, 0, 10);
        assert_eq!(meta.total_pages, 0);
    }
}
