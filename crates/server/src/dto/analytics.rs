//! # Analytics Data Transfer Objects

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::worklogs::WorklogResponse;

/// Query shared by the dashboard, epic, team and user reports
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsQuery {
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    /// Restrict to one instance; disables complementary-group folding
    pub jira_instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamHours {
    pub team_id:      i32,
    pub name:         String,
    pub hours:        f64,
    pub member_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyHours {
    pub date:  NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpicHours {
    pub epic_key:      String,
    pub epic_name:     Option<String>,
    pub hours:         f64,
    pub contributors:  u64,
    pub jira_instance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponse {
    pub start_date:            NaiveDate,
    pub end_date:              NaiveDate,
    pub total_hours:           f64,
    pub expected_hours:        f64,
    pub completion_percentage: f64,
    pub teams:                 Vec<TeamHours>,
    pub daily_trend:           Vec<DailyHours>,
    pub top_epics:             Vec<EpicHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpicListResponse {
    pub epics: Vec<EpicHours>,
}

/// Query for `GET /api/users`; without both dates only the roster is returned
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserReportQuery {
    pub start_date:    Option<NaiveDate>,
    pub end_date:      Option<NaiveDate>,
    pub jira_instance: Option<String>,
}

impl UserReportQuery {
    /// The analytics query when both dates are present.
    pub fn period(&self) -> Option<AnalyticsQuery> {
        Some(AnalyticsQuery {
            start_date:    self.start_date?,
            end_date:      self.end_date?,
            jira_instance: self.jira_instance.clone(),
        })
    }
}

/// Hours of one person inside a team, epic or issue breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberHours {
    pub user_id:   Option<i32>,
    pub email:     String,
    pub full_name: String,
    pub team_name: Option<String>,
    pub hours:     f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    pub user_id:   i32,
    pub email:     String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub team_id:      i32,
    pub name:         String,
    pub member_count: u64,
    pub members:      Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummaryListResponse {
    pub teams: Vec<TeamSummary>,
}

/// Body of `GET /api/teams/{name}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamReportResponse {
    pub team_id:               i32,
    pub team_name:             String,
    pub start_date:            NaiveDate,
    pub end_date:              NaiveDate,
    pub total_hours:           f64,
    pub expected_hours:        f64,
    pub completion_percentage: f64,
    pub members:               Vec<MemberHours>,
    pub epics:                 Vec<EpicHours>,
    pub daily_trend:           Vec<DailyHours>,
}

/// Per-period figures of one user in `GET /api/users`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPeriodStats {
    pub total_hours:           f64,
    /// Every instance, including complementary mirrors
    pub hours_by_instance:     BTreeMap<String, f64>,
    pub expected_hours:        f64,
    pub completion_percentage: f64,
    pub worklog_count:         u64,
    pub initiative_count:      u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReportRow {
    pub id:        i32,
    pub email:     String,
    pub full_name: String,
    pub team_name: Option<String>,
    #[serde(flatten)]
    pub stats:     Option<UserPeriodStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReportListResponse {
    pub users: Vec<UserReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceTrend {
    pub jira_instance: String,
    pub daily_trend:   Vec<DailyHours>,
}

/// Body of `GET /api/users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReportResponse {
    pub user_id:                 i32,
    pub email:                   String,
    pub full_name:               String,
    pub team_name:               Option<String>,
    pub start_date:              NaiveDate,
    pub end_date:                NaiveDate,
    pub total_hours:             f64,
    pub expected_hours:          f64,
    pub completion_percentage:   f64,
    pub epics:                   Vec<EpicHours>,
    pub daily_trend:             Vec<DailyHours>,
    pub daily_trend_by_instance: Vec<InstanceTrend>,
    pub worklogs:                Vec<WorklogResponse>,
}

/// Body of `GET /api/epics/{key}`; an epic with no work in range is empty, not 404
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpicDetailResponse {
    pub epic_key:      String,
    pub epic_name:     Option<String>,
    pub jira_instance: Option<String>,
    pub total_hours:   f64,
    pub contributors:  Vec<MemberHours>,
    pub daily_trend:   Vec<DailyHours>,
    pub worklogs:      Vec<WorklogResponse>,
}

/// Query for `GET /api/issues/{key}`; dates default to the 90 days up to today
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueReportQuery {
    pub start_date:    Option<NaiveDate>,
    pub end_date:      Option<NaiveDate>,
    pub jira_instance: Option<String>,
}

/// Body of `GET /api/issues/{key}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDetailResponse {
    pub issue_key:     String,
    pub issue_summary: String,
    pub jira_instance: String,
    pub parent_key:    Option<String>,
    pub parent_name:   Option<String>,
    pub parent_type:   Option<String>,
    pub epic_key:      Option<String>,
    pub epic_name:     Option<String>,
    pub total_hours:   f64,
    pub contributors:  Vec<MemberHours>,
    pub daily_trend:   Vec<DailyHours>,
    pub worklogs:      Vec<WorklogResponse>,
}
