//! Invoices Entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sea_orm_active_enums::InvoiceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:              i32,
    pub company_id:      i32,
    pub client_id:       i32,
    pub project_id:      Option<i32>,
    pub period_start:    Date,
    pub period_end:      Date,
    pub status:          InvoiceStatus,
    pub currency:        String,
    pub subtotal_amount: f64,
    pub taxes_amount:    f64,
    pub total_amount:    f64,
    pub group_by:        String,
    pub issued_at:       Option<DateTimeUtc>,
    pub voided_at:       Option<DateTimeUtc>,
    pub created_by:      i32,
    pub created_at:      DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_line_items::Entity")]
    LineItems,
}

impl Related<super::invoice_line_items::Entity> for Entity {
    fn to() -> RelationDef { Relation::LineItems.def() }
}

impl ActiveModelBehavior for ActiveModel {}
