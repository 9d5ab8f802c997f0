//! AssetSequence entity - per-day asset code counter
//!
//! Table: asset_sequence. One row per `YYMMDD` date key; `current_count` only grows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_sequence")]
pub struct Model {
    /// Date key in `YYMMDD` form
    #[sea_orm(primary_key, auto_increment = false, column_type = "String(Some(6))")]
    pub date: String,

    /// Last issued counter for the day
    pub current_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
