//! `SeaORM` Entity for ledger_requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub created_by_id: String,
    pub owner_id: String,
    /// JSON array of party ids.
    #[sea_orm(column_type = "JsonBinary")]
    pub related_ids: Json,
    pub amount: Decimal,
    /// JSON array of transaction ids, one per related party.
    #[sea_orm(column_type = "JsonBinary")]
    pub transaction_ids: Json,
    /// JSON array of receipt ids in attachment order.
    #[sea_orm(column_type = "JsonBinary")]
    pub receipt_ids: Json,
    pub description: String,
    /// Insertion order, assigned by the database.
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
