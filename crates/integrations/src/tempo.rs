//! Tempo Timesheets API v4 client.
//!
//! Fetches worklogs per Atlassian account id, which keeps the sync limited
//! to users configured in the tenant.

use chrono::{NaiveDate, NaiveTime};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{http::send_json, RawWorklog, Result, RetryConfig};

const SERVICE: &str = "tempo";

/// Page size requested from Tempo.
pub const PAGE_LIMIT: usize = 1000;

/// Hard stop per user, protecting against runaway pagination.
pub const MAX_WORKLOGS_PER_USER: usize = 10_000;

#[derive(Debug, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    results: Vec<TempoWorklog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TempoWorklog {
    tempo_worklog_id:   serde_json::Value,
    #[serde(default)]
    issue:              TempoIssue,
    #[serde(default)]
    time_spent_seconds: i64,
    start_date:         NaiveDate,
    #[serde(default)]
    start_time:         Option<NaiveTime>,
    #[serde(default)]
    author:             TempoAuthor,
}

#[derive(Debug, Default, Deserialize)]
struct TempoIssue {
    #[serde(default)]
    id:  Option<serde_json::Value>,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TempoAuthor {
    #[serde(default)]
    account_id:   Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// Render a JSON id (Tempo mixes numbers and strings) without quotes.
fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Async client for one Tempo account.
#[derive(Debug, Clone)]
pub struct TempoClient {
    http:     reqwest::Client,
    base_url: String,
    token:    SecretString,
    instance: String,
    retry:    RetryConfig,
}

impl TempoClient {
    /// Public Tempo Cloud API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.tempo.io";

    /// Create a client for the JIRA instance `instance` authenticated by `token`.
    pub fn new(http: reqwest::Client, instance: impl Into<String>, token: SecretString) -> Self {
        Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            token,
            instance: instance.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the client at another API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every worklog of `account_id` between `from` and `to` inclusive.
    ///
    /// The author email is left empty; Tempo only knows account ids, so the
    /// caller fills it from the tenant's account mapping.
    pub async fn user_worklogs(&self, account_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<RawWorklog>> {
        let url = format!("{}/4/worklogs/user/{}", self.base_url, account_id);
        let mut worklogs = Vec::new();
        let mut offset = 0usize;

        loop {
            let page: WorklogPage = send_json(SERVICE, &self.retry, || {
                self.http
                    .get(&url)
                    .bearer_auth(self.token.expose_secret())
                    .query(&[
                        ("from", from.to_string()),
                        ("to", to.to_string()),
                        ("limit", PAGE_LIMIT.to_string()),
                        ("offset", offset.to_string()),
                    ])
            })
            .await?;

            let fetched = page.results.len();
            worklogs.extend(page.results.into_iter().map(|w| self.map_worklog(account_id, w)));

            if fetched < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
            if offset >= MAX_WORKLOGS_PER_USER {
                warn!(
                    instance = %self.instance,
                    account_id,
                    "Tempo safety limit reached, remaining worklogs skipped"
                );
                break;
            }
        }

        debug!(instance = %self.instance, account_id, count = worklogs.len(), "Fetched Tempo worklogs");
        Ok(worklogs)
    }

    fn map_worklog(&self, account_id: &str, worklog: TempoWorklog) -> RawWorklog {
        let started = worklog
            .start_date
            .and_time(worklog.start_time.unwrap_or(NaiveTime::MIN))
            .and_utc();
        let issue_id = worklog.issue.id.as_ref().map(id_string);
        let issue_key = worklog
            .issue
            .key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| issue_id.clone())
            .unwrap_or_default();

        RawWorklog {
            id: format!(
                "{}_tempo_{}",
                self.instance,
                id_string(&worklog.tempo_worklog_id)
            ),
            jira_instance: self.instance.clone(),
            issue_key,
            issue_id,
            issue_summary: String::new(),
            author_email: String::new(),
            author_display_name: worklog.author.display_name.unwrap_or_default(),
            author_account_id: worklog
                .author
                .account_id
                .or_else(|| Some(account_id.to_string())),
            time_spent_seconds: worklog.time_spent_seconds,
            started,
            epic_key: None,
            epic_name: None,
            parent_key: None,
            parent_name: None,
            parent_type: None,
        }
    }
}
