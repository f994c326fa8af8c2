//! Billing Clients Entity
//!
//! A customer invoiced for work. The client default rate is the last step of
//! the rate cascade.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:                  i32,
    pub company_id:          i32,
    pub name:                String,
    pub billing_currency:    String,
    pub default_hourly_rate: Option<f64>,
    pub created_at:          DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::billing_projects::Entity")]
    Projects,
}

impl Related<super::billing_projects::Entity> for Entity {
    fn to() -> RelationDef { Relation::Projects.def() }
}

impl ActiveModelBehavior for ActiveModel {}
