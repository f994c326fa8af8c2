//! Users Entity
//!
//! Members of a company. `role` holds `ADMIN`, `MANAGER` or `USER`; email is
//! unique within the company.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:            i32,
    pub company_id:    i32,
    pub email:         String,
    pub first_name:    String,
    pub last_name:     String,
    pub role:          String,
    pub team_id:       Option<i32>,
    pub google_id:     Option<String>,
    pub is_active:     bool,
    pub created_at:    DateTimeUtc,
    pub last_login_at: Option<DateTimeUtc>,
}

impl Model {
    /// "First Last", trimmed when either part is empty.
    pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name).trim().to_string() }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Team,
    #[sea_orm(has_many = "super::user_jira_accounts::Entity")]
    JiraAccounts,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef { Relation::Company.def() }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef { Relation::Team.def() }
}

impl Related<super::user_jira_accounts::Entity> for Entity {
    fn to() -> RelationDef { Relation::JiraAccounts.def() }
}

impl ActiveModelBehavior for ActiveModel {}
