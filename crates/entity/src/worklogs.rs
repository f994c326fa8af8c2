//! Worklogs Entity
//!
//! One time entry synced from Tempo or JIRA. The source id is only unique per
//! instance and tenant, so the primary key is `(company_id, id, jira_instance)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "worklogs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub company_id:          i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:                  String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub jira_instance:       String,
    pub issue_key:           String,
    pub issue_summary:       String,
    pub author_email:        String,
    pub author_display_name: String,
    pub author_account_id:   Option<String>,
    pub time_spent_seconds:  i64,
    pub started:             DateTimeUtc,
    pub epic_key:            Option<String>,
    pub epic_name:           Option<String>,
    pub parent_key:          Option<String>,
    pub parent_name:         Option<String>,
    pub parent_type:         Option<String>,
    pub created_at:          DateTimeUtc,
    pub updated_at:          DateTimeUtc,
}

impl Model {
    /// Time spent in hours.
    pub fn hours(&self) -> f64 { self.time_spent_seconds as f64 / 3600.0 }

    /// JIRA project key: the issue key up to the first `-`.
    pub fn project_key(&self) -> &str {
        self.issue_key
            .split_once('-')
            .map_or(self.issue_key.as_str(), |(project, _)| project)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
