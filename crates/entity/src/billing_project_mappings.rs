//! Billing Project Mappings Entity
//!
//! Links a billing project to a JIRA project key on one instance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_project_mappings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:               i32,
    pub company_id:       i32,
    pub project_id:       i32,
    pub jira_instance:    String,
    pub jira_project_key: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing_projects::Entity",
        from = "Column::ProjectId",
        to = "super::billing_projects::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::billing_projects::Entity> for Entity {
    fn to() -> RelationDef { Relation::Project.def() }
}

impl ActiveModelBehavior for ActiveModel {}
