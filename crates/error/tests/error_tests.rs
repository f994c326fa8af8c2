//! # Error Crate Tests
//!
//! Tests for error types, responses, and conversions.

#[cfg(test)]
mod error_status_mapping_tests {
    use error::AppError;
    use http::StatusCode;

    #[test]
    fn test_api_error_classes() {
        assert_eq!(
            AppError::unauthorized("Missing authorization header").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("Admin privileges required").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("Billing client not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::validation("hourly_rate must not be negative").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::conflict("Team already exists").status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_error_code_uniqueness() {
        let codes = [
            AppError::not_found("x").code(),
            AppError::bad_request("x").code(),
            AppError::unauthorized("x").code(),
            AppError::JwtExpired.code(),
            AppError::JwtInvalidToken.code(),
            AppError::forbidden("x").code(),
            AppError::conflict("x").code(),
            AppError::validation("x").code(),
            AppError::rate_limited(1).code(),
            AppError::upstream("x").code(),
            AppError::internal("x").code(),
            AppError::database("x").code(),
            AppError::config("x").code(),
            AppError::from(std::io::Error::other("x")).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_error_code_format() {
        let code = AppError::validation("x").code();
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
    }
}

#[cfg(test)]
mod into_response_tests {
    use axum::response::IntoResponse;
    use error::AppError;
    use http::StatusCode;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::not_found("Invoice not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Invoice not found");
    }

    #[tokio::test]
    async fn test_upstream_body_is_generic() {
        let response = AppError::upstream("tempo returned HTTP 500: stack trace").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Upstream service error");
    }
}

#[cfg(test)]
mod api_response_tests {
    use error::{ApiResponse, PaginationMeta};
    use serde_json::json;

    #[test]
    fn test_api_response_ok_with_data() {
        let response = ApiResponse::ok(json!({"id": 1, "name": "Platform"}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["name"], "Platform");
    }

    #[test]
    fn test_api_response_error_with_details() {
        let response: ApiResponse<()> =
            ApiResponse::error_with_details("VALIDATION_ERROR", "Invalid", json!({"field": "start_date"}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["details"]["field"], "start_date");
    }

    #[test]
    fn test_pagination_last_page() {
        let meta = PaginationMeta::new(3, 50, 120);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert_eq!(meta.offset(), Some(100));
    }
}
