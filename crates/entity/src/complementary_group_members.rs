//! Complementary Group Members Entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "complementary_group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id:    i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub instance_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complementary_groups::Entity",
        from = "Column::GroupId",
        to = "super::complementary_groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::jira_instances::Entity",
        from = "Column::InstanceId",
        to = "super::jira_instances::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Instance,
}

impl Related<super::complementary_groups::Entity> for Entity {
    fn to() -> RelationDef { Relation::Group.def() }
}

impl Related<super::jira_instances::Entity> for Entity {
    fn to() -> RelationDef { Relation::Instance.def() }
}

impl ActiveModelBehavior for ActiveModel {}
