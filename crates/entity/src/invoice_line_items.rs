//! Invoice Line Items Entity
//!
//! Snapshot of one preview line at invoice creation. `metadata` is JSON text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_line_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:             i32,
    pub invoice_id:     i32,
    pub line_type:      String,
    pub group_key:      String,
    pub description:    String,
    pub quantity_hours: f64,
    pub hourly_rate:    f64,
    pub amount:         f64,
    pub sort_order:     i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata:       Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Invoice,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef { Relation::Invoice.def() }
}

impl ActiveModelBehavior for ActiveModel {}
