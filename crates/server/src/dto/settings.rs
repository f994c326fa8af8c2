//! # Settings Data Transfer Objects
//!
//! Teams, users, JIRA instances, complementary groups and holidays.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{auth::UserResponse, double_option};

/// Request to create or rename a team
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct TeamRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Team name must be between 1 and 100 characters"
    ))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResponse {
    pub id:           i32,
    pub name:         String,
    pub member_count: u64,
    pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamListResponse {
    pub teams: Vec<TeamResponse>,
}

/// Query for the user list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub team_id: Option<i32>,
}

/// Request to create a user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email:      String,
    #[validate(length(max = 100, message = "First name must not exceed 100 characters"))]
    pub first_name: String,
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name:  String,
    pub team_id:    Option<i32>,
    pub role:       Option<String>,
}

/// Partial user update; `team_id: null` unassigns the team
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 100, message = "First name must not exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name:  Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub team_id:    Option<Option<i32>>,
    pub role:       Option<String>,
    pub is_active:  Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() &&
            self.last_name.is_none() &&
            self.team_id.is_none() &&
            self.role.is_none() &&
            self.is_active.is_none()
    }
}

/// Request to map a user to a JIRA account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct JiraAccountRequest {
    #[validate(length(min = 1, message = "JIRA instance is required"))]
    pub jira_instance: String,
    #[validate(length(min = 1, max = 128, message = "Account id must be between 1 and 128 characters"))]
    pub account_id:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JiraAccountResponse {
    pub jira_instance: String,
    pub account_id:    String,
}

/// User with their JIRA account mappings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user:          UserResponse,
    pub jira_accounts: Vec<JiraAccountResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserDetailResponse>,
}

/// Request to register a JIRA instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateJiraInstanceRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name:              String,
    #[validate(url(message = "Invalid JIRA URL"))]
    pub url:               String,
    #[validate(email(message = "Invalid email format"))]
    pub email:             String,
    #[validate(length(min = 1, message = "API token is required"))]
    pub api_token:         String,
    pub tempo_api_token:   Option<String>,
    pub billing_client_id: Option<i32>,
}

/// Partial JIRA instance update; `null` clears the Tempo token or client
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct UpdateJiraInstanceRequest {
    #[validate(url(message = "Invalid JIRA URL"))]
    pub url:               Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email:             Option<String>,
    #[validate(length(min = 1, message = "API token must not be empty"))]
    pub api_token:         Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub tempo_api_token:   Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub billing_client_id: Option<Option<i32>>,
    pub is_active:         Option<bool>,
}

impl UpdateJiraInstanceRequest {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() &&
            self.email.is_none() &&
            self.api_token.is_none() &&
            self.tempo_api_token.is_none() &&
            self.billing_client_id.is_none() &&
            self.is_active.is_none()
    }
}

/// JIRA instance without its credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JiraInstanceResponse {
    pub id:                i32,
    pub name:              String,
    pub url:               String,
    pub email:             String,
    pub has_tempo_token:   bool,
    pub billing_client_id: Option<i32>,
    pub is_active:         bool,
    pub created_at:        DateTime<Utc>,
}

impl From<entity::jira_instances::Model> for JiraInstanceResponse {
    fn from(instance: entity::jira_instances::Model) -> Self {
        Self {
            id:                instance.id,
            name:              instance.name,
            url:               instance.url,
            email:             instance.email,
            has_tempo_token:   instance
                .tempo_api_token
                .as_deref()
                .is_some_and(|t| !t.is_empty()),
            billing_client_id: instance.billing_client_id,
            is_active:         instance.is_active,
            created_at:        instance.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JiraInstanceListResponse {
    pub instances: Vec<JiraInstanceResponse>,
}

/// Result of a JIRA connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionTestResponse {
    pub success:      bool,
    pub account_id:   String,
    pub display_name: Option<String>,
}

/// Result of matching users to JIRA accounts by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAccountsResponse {
    pub matched:   Vec<String>,
    pub not_found: Vec<String>,
}

/// Request to create a complementary group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateComplementaryGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name:                String,
    #[validate(length(min = 2, message = "A group needs at least two instances"))]
    pub instance_ids:        Vec<i32>,
    pub primary_instance_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInstanceResponse {
    pub id:   i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplementaryGroupResponse {
    pub id:                  i32,
    pub name:                String,
    pub primary_instance_id: Option<i32>,
    pub instances:           Vec<GroupInstanceResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplementaryGroupListResponse {
    pub groups: Vec<ComplementaryGroupResponse>,
}

/// Query for the holiday list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolidayListQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateHolidayRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name:         String,
    pub holiday_date: NaiveDate,
    #[validate(length(min = 2, max = 2, message = "Country must be a two-letter code"))]
    pub country:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolidayResponse {
    pub id:           i32,
    pub name:         String,
    pub holiday_date: NaiveDate,
    pub country:      String,
    pub is_active:    bool,
}

impl From<entity::holidays::Model> for HolidayResponse {
    fn from(holiday: entity::holidays::Model) -> Self {
        Self {
            id:           holiday.id,
            name:         holiday.name,
            holiday_date: holiday.holiday_date,
            country:      holiday.country,
            is_active:    holiday.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolidayListResponse {
    pub holidays: Vec<HolidayResponse>,
}
