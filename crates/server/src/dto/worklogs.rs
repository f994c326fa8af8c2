//! # Worklog Data Transfer Objects

use chrono::{DateTime, NaiveDate, Utc};
use error::PaginationMeta;
use serde::{Deserialize, Serialize};

/// Query for `GET /api/worklogs`
#[derive(Debug, Clone, Deserialize)]
pub struct WorklogListQuery {
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    pub jira_instance: Option<String>,
    pub user_email:    Option<String>,
    pub page:          Option<u64>,
    pub per_page:      Option<u64>,
}

impl WorklogListQuery {
    pub const DEFAULT_PER_PAGE: u64 = 50;
    pub const MAX_PER_PAGE: u64 = 500;

    pub fn page(&self) -> u64 { self.page.unwrap_or(1).max(1) }

    pub fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }
}

/// Query for `DELETE /api/worklogs`
#[derive(Debug, Clone, Deserialize)]
pub struct WorklogDeleteQuery {
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    pub jira_instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorklogResponse {
    pub id:                  String,
    pub jira_instance:       String,
    pub issue_key:           String,
    pub issue_summary:       String,
    pub author_email:        String,
    pub author_display_name: String,
    pub time_spent_seconds:  i64,
    pub hours:               f64,
    pub started:             DateTime<Utc>,
    pub epic_key:            Option<String>,
    pub epic_name:           Option<String>,
    pub parent_key:          Option<String>,
    pub parent_name:         Option<String>,
    pub parent_type:         Option<String>,
}

impl From<entity::worklogs::Model> for WorklogResponse {
    fn from(worklog: entity::worklogs::Model) -> Self {
        Self {
            hours:               crate::utils::round2(worklog.hours()),
            id:                  worklog.id,
            jira_instance:       worklog.jira_instance,
            issue_key:           worklog.issue_key,
            issue_summary:       worklog.issue_summary,
            author_email:        worklog.author_email,
            author_display_name: worklog.author_display_name,
            time_spent_seconds:  worklog.time_spent_seconds,
            started:             worklog.started,
            epic_key:            worklog.epic_key,
            epic_name:           worklog.epic_name,
            parent_key:          worklog.parent_key,
            parent_name:         worklog.parent_name,
            parent_type:         worklog.parent_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorklogListResponse {
    pub worklogs:   Vec<WorklogResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorklogDeleteResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_page_is_clamped() {
        let query: WorklogListQuery = serde_json::from_value(serde_json::json!({
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "per_page": 10_000,
            "page": 0
        }))
        .unwrap();
        assert_eq!(query.per_page(), 500);
        assert_eq!(query.page(), 1);

        let query: WorklogListQuery = serde_json::from_value(serde_json::json!({
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "per_page": 0
        }))
        .unwrap();
        assert_eq!(query.per_page(), 1);
    }
}
