//! Billing Rates Entity
//!
//! A rate rule on a project. `user_email` and `issue_type` narrow the rule;
//! `valid_from`/`valid_to` bound it in time, open ends match any date.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_rates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:          i32,
    pub company_id:  i32,
    pub project_id:  i32,
    pub user_email:  Option<String>,
    pub issue_type:  Option<String>,
    pub hourly_rate: f64,
    pub valid_from:  Option<Date>,
    pub valid_to:    Option<Date>,
    pub created_at:  DateTimeUtc,
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
