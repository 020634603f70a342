//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub related_id: String,
    /// Canonical unordered pair, unique.
    #[sea_orm(unique)]
    pub pair_key: String,
    pub balance: i64,
    pub currency: String,
    pub currency_symbol: String,
    pub created_at: DateTimeWithTimeZone,
}

// Transaction logs reference accounts without a foreign key so they outlive them.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
