//! Billing Worklog Classifications Entity
//!
//! Per-worklog billing overrides, keyed like the worklog itself.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_worklog_classifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:                   i32,
    pub company_id:           i32,
    pub worklog_id:           String,
    pub jira_instance:        String,
    pub is_billable:          bool,
    pub override_hourly_rate: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note:                 Option<String>,
    pub updated_at:           DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
