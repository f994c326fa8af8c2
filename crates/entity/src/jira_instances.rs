//! JIRA Instances Entity
//!
//! Connection settings for one JIRA site. `tempo_api_token` selects the Tempo
//! path during sync; without it worklogs come from JIRA directly.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "jira_instances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:                i32,
    pub company_id:        i32,
    pub name:              String,
    pub url:               String,
    pub email:             String,
    #[serde(skip_serializing)]
    pub api_token:         String,
    #[serde(skip_serializing)]
    pub tempo_api_token:   Option<String>,
    pub billing_client_id: Option<i32>,
    pub is_active:         bool,
    pub created_at:        DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complementary_group_members::Entity")]
    GroupMemberships,
}

impl Related<super::complementary_group_members::Entity> for Entity {
    fn to() -> RelationDef { Relation::GroupMemberships.def() }
}

impl ActiveModelBehavior for ActiveModel {}
