//! Billing Projects Entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:                  i32,
    pub company_id:          i32,
    pub client_id:           i32,
    pub name:                String,
    pub default_hourly_rate: Option<f64>,
    pub created_at:          DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing_clients::Entity",
        from = "Column::ClientId",
        to = "super::billing_clients::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Client,
    #[sea_orm(has_many = "super::billing_project_mappings::Entity")]
    Mappings,
    #[sea_orm(has_many = "super::billing_rates::Entity")]
    Rates,
}

impl Related<super::billing_clients::Entity> for Entity {
    fn to() -> RelationDef { Relation::Client.def() }
}

impl Related<super::billing_project_mappings::Entity> for Entity {
    fn to() -> RelationDef { Relation::Mappings.def() }
}

impl Related<super::billing_rates::Entity> for Entity {
    fn to() -> RelationDef { Relation::Rates.def() }
}

impl ActiveModelBehavior for ActiveModel {}
