//! # Billing
//!
//! Client/project catalog, rate resolution, previews, invoices and their export.

pub mod catalog;
pub mod export;
pub mod invoices;
pub mod preview;
pub mod rates;

pub use preview::build_preview;
pub use rates::{resolve_rate, RateContext, RateSource, ResolvedRate};
