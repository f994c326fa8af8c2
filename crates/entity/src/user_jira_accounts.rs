//! User JIRA Accounts Entity
//!
//! Maps a user to their Atlassian account id on one JIRA instance. Sync uses
//! it to fetch Tempo worklogs per account and to attribute them by email.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user_jira_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:            i32,
    pub company_id:    i32,
    pub user_id:       i32,
    pub jira_instance: String,
    pub account_id:    String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}
