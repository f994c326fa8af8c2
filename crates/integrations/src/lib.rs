//! # Workledger Integrations
//!
//! HTTP clients for the external systems worklogs are synced from:
//!
//! - [`jira`]: JIRA Cloud REST API v3 (issues, worklog fallback, user lookup)
//! - [`tempo`]: Tempo Timesheets API v4 (per-user worklog ranges)
//! - [`hierarchy`]: epic/parent resolution over JIRA issues
//! - [`retry`]: exponential backoff shared by both clients
//!
//! Both clients produce [`RawWorklog`], the shape the worklog store upserts.

pub mod error;
pub mod hierarchy;
mod http;
pub mod jira;
pub mod models;
pub mod retry;
pub mod tempo;

pub use error::IntegrationError;
pub use hierarchy::{resolve_parent, IssueResolver};
pub use jira::{JiraClient, JiraCredentials};
pub use models::{IssueDetails, IssueRef, JiraUser, ParentInfo, RawWorklog};
pub use retry::{execute_with_retry, RetryConfig};
pub use tempo::TempoClient;

/// Convenience type alias for Result with IntegrationError.
pub type Result<T, E = IntegrationError> = std::result::Result<T, E>;
