//! # Sync Data Transfer Objects

use chrono::{DateTime, NaiveDate, Utc};
use entity::sea_orm_active_enums::SyncStatus;
use serde::{Deserialize, Serialize};

/// Request body for `POST /api/sync`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncRequest {
    pub start_date:     NaiveDate,
    pub end_date:       NaiveDate,
    /// Instance names; all active instances when absent or empty
    #[serde(default)]
    pub jira_instances: Option<Vec<String>>,
}

/// Where an instance's worklogs came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    Tempo,
    Jira,
}

/// Outcome of one instance within a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSyncResult {
    pub instance:         String,
    pub status:           SyncStatus,
    pub source:           SyncSource,
    pub worklogs_synced:  i32,
    pub worklogs_updated: i32,
    pub worklogs_deleted: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:            Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResponse {
    pub success:          bool,
    pub sync_id:          i32,
    pub status:           SyncStatus,
    pub worklogs_synced:  i32,
    pub worklogs_updated: i32,
    pub worklogs_deleted: i32,
    pub instances:        Vec<InstanceSyncResult>,
    pub message:          String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncHistoryQuery {
    pub limit: Option<u64>,
}

impl SyncHistoryQuery {
    pub fn limit(&self) -> u64 { self.limit.unwrap_or(20).clamp(1, 100) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncHistoryEntry {
    pub id:               i32,
    pub status:           SyncStatus,
    pub start_date:       NaiveDate,
    pub end_date:         NaiveDate,
    pub worklogs_synced:  i32,
    pub worklogs_updated: i32,
    pub worklogs_deleted: i32,
    pub error_message:    Option<String>,
    pub started_at:       DateTime<Utc>,
    pub completed_at:     Option<DateTime<Utc>>,
}

impl From<entity::sync_history::Model> for SyncHistoryEntry {
    fn from(row: entity::sync_history::Model) -> Self {
        Self {
            id:               row.id,
            status:           row.status,
            start_date:       row.start_date,
            end_date:         row.end_date,
            worklogs_synced:  row.worklogs_synced,
            worklogs_updated: row.worklogs_updated,
            worklogs_deleted: row.worklogs_deleted,
            error_message:    row.error_message,
            started_at:       row.started_at,
            completed_at:     row.completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncHistoryResponse {
    pub history: Vec<SyncHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatusResponse {
    pub total_worklogs:   u64,
    pub date_range_start: Option<DateTime<Utc>>,
    pub date_range_end:   Option<DateTime<Utc>>,
    pub has_data:         bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncDefaultsResponse {
    pub start_date: NaiveDate,
    pub end_date:   NaiveDate,
    pub instances:  Vec<String>,
}
