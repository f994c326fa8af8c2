//! Shapes shared between the clients and the worklog store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A worklog as fetched from JIRA or Tempo, before it is stored.
///
/// `id` is already namespaced by instance (`acme_tempo_123`, `acme_10001`), so
/// together with `jira_instance` it identifies the worklog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWorklog {
    pub id:                  String,
    pub jira_instance:       String,
    /// Issue key, or the numeric issue id until enrichment resolves it.
    pub issue_key:           String,
    pub issue_id:            Option<String>,
    pub issue_summary:       String,
    pub author_email:        String,
    pub author_display_name: String,
    pub author_account_id:   Option<String>,
    pub time_spent_seconds:  i64,
    pub started:             DateTime<Utc>,
    pub epic_key:            Option<String>,
    pub epic_name:           Option<String>,
    pub parent_key:          Option<String>,
    pub parent_name:         Option<String>,
    pub parent_type:         Option<String>,
}

impl RawWorklog {
    /// Copy hierarchy fields onto the worklog.
    pub fn apply_parent(&mut self, parent: ParentInfo) {
        self.epic_key = parent.epic_key;
        self.epic_name = parent.epic_name;
        self.parent_key = parent.parent_key;
        self.parent_name = parent.parent_name;
        self.parent_type = parent.parent_type;
    }
}

/// Reference to a related issue (parent or epic).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueRef {
    pub key:        String,
    pub summary:    String,
    pub issue_type: Option<String>,
}

/// The subset of a JIRA issue needed to place a worklog in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueDetails {
    pub id:           String,
    pub key:          String,
    pub summary:      String,
    pub issue_type:   Option<String>,
    pub parent:       Option<IssueRef>,
    /// Classic-project epic link (`customfield_10014`).
    pub epic_link:    Option<String>,
    pub project_key:  Option<String>,
    pub project_name: Option<String>,
}

/// Epic and parent placement of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParentInfo {
    pub epic_key:    Option<String>,
    pub epic_name:   Option<String>,
    pub parent_key:  Option<String>,
    pub parent_name: Option<String>,
    pub parent_type: Option<String>,
}

/// A JIRA user as returned by `/myself` and `/user/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id:    String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name:  Option<String>,
}
