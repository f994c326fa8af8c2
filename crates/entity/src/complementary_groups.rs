//! Complementary Groups Entity
//!
//! JIRA instances that track the same work. Only the primary instance is
//! counted in unfiltered analytics.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "complementary_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:                  i32,
    pub company_id:          i32,
    pub name:                String,
    pub primary_instance_id: Option<i32>,
    pub created_at:          DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complementary_group_members::Entity")]
    Members,
}

impl Related<super::complementary_group_members::Entity> for Entity {
    fn to() -> RelationDef { Relation::Members.def() }
}

impl ActiveModelBehavior for ActiveModel {}
