//! JIRA Cloud REST API v3 client.
//!
//! Used for issue lookups during sync, for the worklog fallback when an
//! instance has no Tempo token, and for account id lookups.

use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::{
    http::send_json,
    IntegrationError,
    IssueDetails,
    IssueRef,
    JiraUser,
    RawWorklog,
    Result,
    RetryConfig,
};

const SERVICE: &str = "jira";

/// Maximum ids accepted by `POST /worklog/list`.
pub const WORKLOG_LIST_BATCH: usize = 1000;

/// Fields requested for hierarchy resolution.
const ISSUE_FIELDS: &str = "key,summary,parent,issuetype,project,customfield_10014";

/// Connection settings for one JIRA instance.
#[derive(Debug, Clone)]
pub struct JiraCredentials {
    pub base_url:  String,
    pub email:     String,
    pub api_token: SecretString,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    id:     String,
    key:    String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary:   Option<String>,
    #[serde(default)]
    issuetype: Option<NamedField>,
    #[serde(default)]
    parent:    Option<ParentResponse>,
    #[serde(default)]
    project:   Option<ProjectField>,
    #[serde(default, rename = "customfield_10014")]
    epic_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NamedField {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParentResponse {
    key:    String,
    #[serde(default)]
    fields: ParentFields,
}

#[derive(Debug, Default, Deserialize)]
struct ParentFields {
    #[serde(default)]
    summary:   Option<String>,
    #[serde(default)]
    issuetype: Option<NamedField>,
}

#[derive(Debug, Deserialize)]
struct ProjectField {
    key:  String,
    #[serde(default)]
    name: Option<String>,
}

impl From<IssueResponse> for IssueDetails {
    fn from(issue: IssueResponse) -> Self {
        let fields = issue.fields;
        IssueDetails {
            id:           issue.id,
            key:          issue.key,
            summary:      fields.summary.unwrap_or_default(),
            issue_type:   fields.issuetype.and_then(|t| t.name),
            parent:       fields.parent.map(|p| {
                IssueRef {
                    key:        p.key,
                    summary:    p.fields.summary.unwrap_or_default(),
                    issue_type: p.fields.issuetype.and_then(|t| t.name),
                }
            }),
            epic_link:    fields.epic_link.filter(|k| !k.is_empty()),
            project_key:  fields.project.as_ref().map(|p| p.key.clone()),
            project_name: fields.project.and_then(|p| p.name),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedWorklogs {
    #[serde(default)]
    values:    Vec<UpdatedWorklog>,
    #[serde(default)]
    until:     Option<i64>,
    #[serde(default = "default_last_page")]
    last_page: bool,
}

fn default_last_page() -> bool { true }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedWorklog {
    worklog_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraWorklog {
    id:                 String,
    #[serde(default)]
    issue_id:           Option<String>,
    #[serde(default)]
    author:             Option<JiraUser>,
    started:            String,
    #[serde(default)]
    time_spent_seconds: i64,
}

/// Parse JIRA's `2024-01-15T09:30:00.000+0000` timestamps.
pub fn parse_jira_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Async client for one JIRA instance.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http:          reqwest::Client,
    base_url:      String,
    authorization: SecretString,
    instance:      String,
    retry:         RetryConfig,
}

impl JiraClient {
    /// Create a client using Basic auth (`email:api_token`).
    pub fn new(http: reqwest::Client, instance: impl Into<String>, credentials: &JiraCredentials) -> Result<Self> {
        let base_url = credentials.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(IntegrationError::Config {
                service: SERVICE,
                message: format!("URL must be http(s): {}", credentials.base_url),
            });
        }

        let basic = STANDARD.encode(format!(
            "{}:{}",
            credentials.email,
            credentials.api_token.expose_secret()
        ));

        Ok(Self {
            http,
            base_url,
            authorization: SecretString::from(format!("Basic {}", basic)),
            instance: instance.into(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Instance name used to namespace worklog ids.
    pub fn instance(&self) -> &str { &self.instance }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/rest/api/3{}", self.base_url, path))
            .header(
                reqwest::header::AUTHORIZATION,
                self.authorization.expose_secret(),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/rest/api/3{}", self.base_url, path))
            .header(
                reqwest::header::AUTHORIZATION,
                self.authorization.expose_secret(),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// The account behind the configured credentials.
    pub async fn get_myself(&self) -> Result<JiraUser> { send_json(SERVICE, &self.retry, || self.get("/myself")).await }

    /// Find the account id for `email`.
    ///
    /// An exact (case-insensitive) email match wins; a single fuzzy result is
    /// accepted since JIRA hides emails of users with strict privacy settings.
    pub async fn search_user_by_email(&self, email: &str) -> Result<Option<String>> {
        let users: Vec<JiraUser> = send_json(SERVICE, &self.retry, || {
            self.get("/user/search").query(&[("query", email)])
        })
        .await?;

        let exact = users.iter().find(|u| {
            u.email_address
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        });
        Ok(match (exact, users.len()) {
            (Some(user), _) => Some(user.account_id.clone()),
            (None, 1) => Some(users[0].account_id.clone()),
            _ => None,
        })
    }

    /// Fetch an issue by key or numeric id.
    pub async fn get_issue(&self, key_or_id: &str) -> Result<IssueDetails> {
        let path = format!("/issue/{}", key_or_id);
        let issue: IssueResponse = send_json(SERVICE, &self.retry, || {
            self.get(&path).query(&[("fields", ISSUE_FIELDS)])
        })
        .await?;
        Ok(issue.into())
    }

    /// Ids of worklogs updated since `since_ms` (Unix milliseconds).
    pub async fn updated_worklog_ids(&self, since_ms: i64) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        let mut since = since_ms;

        loop {
            let page: UpdatedWorklogs = send_json(SERVICE, &self.retry, || {
                self.get("/worklog/updated").query(&[("since", since)])
            })
            .await?;

            ids.extend(page.values.iter().map(|v| v.worklog_id));
            match page.until {
                Some(until) if !page.last_page && until > since => since = until,
                _ => break,
            }
        }

        Ok(ids)
    }

    async fn worklogs_by_ids(&self, ids: &[u64]) -> Result<Vec<JiraWorklog>> {
        let mut worklogs = Vec::with_capacity(ids.len());
        for batch in ids.chunks(WORKLOG_LIST_BATCH) {
            let body = serde_json::json!({ "ids": batch });
            let page: Vec<JiraWorklog> =
                send_json(SERVICE, &self.retry, || self.post("/worklog/list").json(&body)).await?;
            worklogs.extend(page);
        }
        Ok(worklogs)
    }

    /// Worklogs started between `from` and `to` inclusive, authored by one of
    /// `author_emails` (lowercase).
    ///
    /// Issue keys are left as numeric ids; [`crate::IssueResolver`] resolves
    /// them along with the hierarchy.
    pub async fn worklogs_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        author_emails: &HashSet<String>,
    ) -> Result<Vec<RawWorklog>> {
        let since_ms = from.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
        let ids = self.updated_worklog_ids(since_ms).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let worklogs: Vec<RawWorklog> = self
            .worklogs_by_ids(&ids)
            .await?
            .into_iter()
            .filter_map(|w| self.map_worklog(w))
            .filter(|w| {
                let day = w.started.date_naive();
                day >= from && day <= to && author_emails.contains(&w.author_email.to_lowercase())
            })
            .collect();

        debug!(instance = %self.instance, scanned = ids.len(), kept = worklogs.len(), "Fetched JIRA worklogs");
        Ok(worklogs)
    }

    fn map_worklog(&self, worklog: JiraWorklog) -> Option<RawWorklog> {
        let started = parse_jira_datetime(&worklog.started)?;
        let author = worklog.author;
        let issue_id = worklog.issue_id;

        Some(RawWorklog {
            id: format!("{}_{}", self.instance, worklog.id),
            jira_instance: self.instance.clone(),
            issue_key: issue_id.clone().unwrap_or_default(),
            issue_id,
            issue_summary: String::new(),
            author_email: author
                .as_ref()
                .and_then(|a| a.email_address.clone())
                .unwrap_or_default(),
            author_display_name: author
                .as_ref()
                .and_then(|a| a.display_name.clone())
                .unwrap_or_default(),
            author_account_id: author.map(|a| a.account_id),
            time_spent_seconds: worklog.time_spent_seconds,
            started,
            epic_key: None,
            epic_name: None,
            parent_key: None,
            parent_name: None,
            parent_type: None,
        })
    }
}
