//! # Extractors
//!
//! Wrappers around axum's extractors whose rejections render as [`AppError`],
//! so malformed bodies and query strings get the standard 422 envelope.

use axum::extract::{FromRequest, FromRequestParts};
use error::AppError;

/// JSON body extractor rejecting with 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor rejecting with 422.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor; an unparsable id is reported as not found.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
