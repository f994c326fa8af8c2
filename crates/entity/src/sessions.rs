//! Sessions Entity
//!
//! One row per issued refresh token. Only the BLAKE3 hash of the token is
//! stored; rotation revokes the old row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:                 i32,
    pub user_id:            i32,
    pub company_id:         i32,
    #[sea_orm(unique)]
    pub refresh_token_hash: String,
    pub expires_at:         DateTimeUtc,
    pub created_at:         DateTimeUtc,
    pub revoked_at:         Option<DateTimeUtc>,
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
