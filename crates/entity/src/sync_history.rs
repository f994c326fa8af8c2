//! Sync History Entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sea_orm_active_enums::SyncStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:               i32,
    pub company_id:       i32,
    pub status:           SyncStatus,
    pub start_date:       Date,
    pub end_date:         Date,
    pub worklogs_synced:  i32,
    pub worklogs_updated: i32,
    pub worklogs_deleted: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message:    Option<String>,
    pub started_at:       DateTimeUtc,
    pub completed_at:     Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
